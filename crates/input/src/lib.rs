//! Input collaborator: device events folded into per-sub-step snapshots.
//!
//! # Invariants
//! - The simulation consumes snapshots, never raw device events.
//! - Taking a snapshot zeroes pointer deltas and clears edge sets, so a
//!   press fires exactly once.

mod state;

pub use state::{InputSnapshot, InputState, Key, MouseButton};
