//! Shared types for the orbital simulation.
//!
//! # Invariants
//! - Entity ids are plain values; the world that issued them owns their meaning.
//! - Render metadata is opaque payload for everything but the render layer.

mod types;

pub use types::{Appearance, EntityId, GeometryKind, ShaderTag, TagError};
