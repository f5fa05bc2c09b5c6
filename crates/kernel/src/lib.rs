//! Simulation kernel: scene graph, gravity integration, fixed-rate driver.
//!
//! # Invariants
//! - The entity hierarchy is a tree; world = parent world * local.
//! - Dirty flags flow down, recomputation flows up.
//! - Within a tick every entity update completes before any transform is
//!   handed to the render layer.
//! - Simulation state (time scale, halt flag) lives on [`SimContext`], never
//!   in process-wide globals.

pub mod behavior;
pub mod context;
mod entity;
pub mod physics;
pub mod sim;
pub mod world;

pub use behavior::{Behavior, Follow, Spin, TickContext, TickTime};
pub use context::{ConfigError, GravityLaw, SimConfig, SimContext};
pub use entity::Entity;
pub use sim::Simulation;
pub use world::{SceneError, World};
