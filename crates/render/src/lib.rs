//! Render collaborator: frame capture, procedural geometry and backends.
//!
//! # Invariants
//! - A backend only sees [`RenderFrame`]s, never the simulation itself.
//! - Frames are captured after transforms are finalized.
//! - Every added or removed entity is reported to the backend exactly once.

mod cache;
mod frame;
pub mod geometry;
mod renderer;

pub use cache::{DrawStats, GeometryCache, VertexBuffer};
pub use frame::{Drawable, FrameAnchors, RenderFrame};
pub use geometry::{GeometryError, Mesh, build_mesh};
pub use renderer::{DebugTextRenderer, Renderer};
