//! Developer tooling: read-only inspection of a running simulation.

mod inspector;

pub use inspector::{EntityInfo, SimSummary, WorldInspector};
