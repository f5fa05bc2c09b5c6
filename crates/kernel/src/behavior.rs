use glam::Vec3;
use orbital_common::EntityId;
use orbital_input::InputSnapshot;
use std::fmt;

use crate::context::SimContext;
use crate::world::World;

/// Simulated time of one physics sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickTime {
    /// Seconds since the simulation started, at the start of this sub-step.
    pub t: f64,
    /// Seconds advanced by this sub-step.
    pub dt: f32,
}

/// Everything a behavior may read or mutate during its tick.
pub struct TickContext<'a> {
    /// The entity this behavior is attached to.
    pub entity: EntityId,
    pub time: TickTime,
    pub input: &'a InputSnapshot,
    pub world: &'a mut World,
    pub sim: &'a mut SimContext,
}

/// Per-entity update capability.
///
/// A behavior owns its private state. It runs before gravity and integration
/// for its entity and may spawn or despawn other entities; entities spawned
/// during a sub-step are first updated on the next one.
pub trait Behavior: fmt::Debug {
    fn on_tick(&mut self, cx: &mut TickContext<'_>);
}

/// Constant rotation about the local axes, in radians per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub rates: Vec3,
}

impl Spin {
    pub fn new(rates: Vec3) -> Self {
        Self { rates }
    }
}

impl Behavior for Spin {
    fn on_tick(&mut self, cx: &mut TickContext<'_>) {
        let dt = cx.time.dt;
        if self.rates.x != 0.0 {
            cx.world.rotate_x(cx.entity, self.rates.x * dt);
        }
        if self.rates.y != 0.0 {
            cx.world.rotate_y(cx.entity, self.rates.y * dt);
        }
        if self.rates.z != 0.0 {
            cx.world.rotate_z(cx.entity, self.rates.z * dt);
        }
    }
}

/// Keeps the entity at another entity's world position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Follow {
    pub target: EntityId,
}

impl Behavior for Follow {
    fn on_tick(&mut self, cx: &mut TickContext<'_>) {
        if let Some(position) = cx.world.world_position(self.target) {
            cx.world.set_position(cx.entity, position);
        }
    }
}
