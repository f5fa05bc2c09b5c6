//! One physics sub-step: behaviors, two-body gravity, semi-implicit Euler.

use glam::Vec3;
use orbital_common::EntityId;
use orbital_input::InputSnapshot;

use crate::behavior::{TickContext, TickTime};
use crate::context::{GravityLaw, SimConfig, SimContext};
use crate::world::World;

/// Advance every live entity by one sub-step, in insertion order.
///
/// For each entity: run its behavior, add gravitational acceleration toward
/// its orbit parent to its velocity, then move it by the updated velocity.
/// Entities spawned during the step are first visited on the next step;
/// entities despawned earlier in the step are skipped.
pub fn step(world: &mut World, sim: &mut SimContext, time: TickTime, input: &InputSnapshot) {
    for id in world.ids() {
        if !world.contains(id) {
            continue;
        }

        if let Some(mut behavior) = world.take_behavior(id) {
            {
                let mut cx = TickContext {
                    entity: id,
                    time,
                    input,
                    world: &mut *world,
                    sim: &mut *sim,
                };
                behavior.on_tick(&mut cx);
            }
            world.restore_behavior(id, behavior);
        }

        apply_gravity(world, &sim.config, id, time.dt);
        integrate(world, id, time.dt);
    }
}

/// Acceleration magnitude on a body of `body_mass` at squared distance
/// `distance_squared` from an attractor of `attractor_mass`.
pub fn gravitational_acceleration(
    config: &SimConfig,
    attractor_mass: f32,
    body_mass: f32,
    distance_squared: f32,
) -> f32 {
    let g = config.gravitational_constant;
    match config.gravity_law {
        GravityLaw::Scaled => g * attractor_mass * body_mass / distance_squared,
        GravityLaw::Newtonian => g * attractor_mass / distance_squared,
    }
}

/// Bodies at rest, massless bodies and bodies without a massive live orbit
/// parent are left alone.
///
/// # Panics
/// If the body and its orbit parent occupy the same position.
fn apply_gravity(world: &mut World, config: &SimConfig, id: EntityId, dt: f32) {
    let Some(entity) = world.get(id) else {
        return;
    };
    if entity.velocity == Vec3::ZERO || entity.mass == 0.0 {
        return;
    }
    let Some(parent) = entity.orbit_parent else {
        return;
    };
    let mass = entity.mass;
    let Some(parent_mass) = world.get(parent).map(|p| p.mass) else {
        tracing::trace!(entity = %id, orbit_parent = %parent, "orbit parent is gone");
        return;
    };
    if parent_mass == 0.0 {
        return;
    }

    let (Some(from), Some(to)) = (world.world_position(id), world.world_position(parent)) else {
        return;
    };
    let offset = to - from;
    let distance_squared = offset.length_squared();
    assert!(
        distance_squared > 0.0,
        "entity {id} coincides with its orbit parent {parent}"
    );

    let acceleration = gravitational_acceleration(config, parent_mass, mass, distance_squared);
    if let Some(entity) = world.get_mut(id) {
        entity.velocity += offset.normalize() * acceleration * dt;
    }
}

fn integrate(world: &mut World, id: EntityId, dt: f32) {
    let Some(velocity) = world.get(id).map(|e| e.velocity) else {
        return;
    };
    if velocity != Vec3::ZERO {
        world.translate(id, velocity * dt);
    }
}
