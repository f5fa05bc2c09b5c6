use glam::Vec3;
use orbital_common::{Appearance, EntityId, GeometryKind, ShaderTag};
use orbital_kernel::{Follow, Simulation, Spin, World};
use std::f32::consts::PI;

use crate::camera::OrbitCamera;
use crate::rocket::{RocketConfig, RocketController};
use crate::script::FlightScript;

pub const PLANET_RADIUS: f32 = 2500.0;
pub const PLANET_MASS: f32 = 1.0e8;
pub const MOON_RADIUS: f32 = 1250.0;
pub const MOON_MASS: f32 = 1.0e4;
pub const SUN_RADIUS: f32 = 15_000.0;
pub const SKY_SIZE: f32 = 190_000.0;

/// Handles to the entities of the demo scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoScene {
    /// Slowly spinning pivot carrying the sun.
    pub origin: EntityId,
    pub sun: EntityId,
    pub halo: EntityId,
    pub planet: EntityId,
    pub moon: EntityId,
    pub pad: EntityId,
    pub rocket: EntityId,
    /// Node under the rocket's nozzle where exhaust particles attach.
    pub spawn_point: EntityId,
    pub sky: EntityId,
    pub camera: EntityId,
}

fn body(
    world: &mut World,
    geometry: GeometryKind,
    size: f32,
    shader: ShaderTag,
    color: Vec3,
) -> EntityId {
    world.spawn_with(
        Appearance {
            geometry: Some(geometry),
            size,
            shader,
            color,
            shared_geometry: false,
        },
        None,
    )
}

fn attach(world: &mut World, child: EntityId, parent: EntityId) {
    // both ids were just spawned, so this cannot fail
    if let Err(err) = world.set_parent(child, Some(parent)) {
        tracing::error!(%err, "demo scene wiring failed");
    }
}

/// Populate `sim` with the launch-to-orbit demo: a planet with a moon in
/// orbit, a distant sun on a rotating pivot, a launch pad and the rocket on
/// the planet's north pole, the sky box and a chase camera.
///
/// Entities are spawned in update order: the sky and the camera come after
/// the rocket so they track its position from the same sub-step.
pub fn build_demo_scene(sim: &mut Simulation, script: FlightScript, rocket: RocketConfig) -> DemoScene {
    let world = &mut sim.world;
    let _span = tracing::info_span!("build_demo_scene").entered();

    let origin = world.spawn(None, 0.0, Some(Box::new(Spin::new(Vec3::new(0.0, 1.0e-4, 1.0e-4)))));

    let sun = body(world, GeometryKind::Sphere, SUN_RADIUS, ShaderTag::Sun, Vec3::new(1.0, 0.9, 0.0));
    attach(world, sun, origin);
    world.translate(sun, Vec3::new(0.0, 60_000.0, -60_000.0));
    let halo = body(world, GeometryKind::Sphere, SUN_RADIUS * 1.25, ShaderTag::Halo, Vec3::ONE);
    attach(world, halo, sun);

    let planet = body(
        world,
        GeometryKind::Sphere,
        PLANET_RADIUS,
        ShaderTag::Planet,
        Vec3::new(0.3, 0.8, 0.2),
    );
    world.rotate_y(planet, 2.0);
    let planet_position = world.world_position(planet).unwrap_or(Vec3::ZERO);
    if let Some(p) = world.get_mut(planet) {
        p.mass = PLANET_MASS;
    }

    let moon = body(world, GeometryKind::Sphere, MOON_RADIUS, ShaderTag::Planet, Vec3::ONE);
    world.set_behavior(moon, Some(Box::new(Spin::new(Vec3::new(0.0, 1.0e-3, 0.0)))));
    world.translate(moon, planet_position + Vec3::new(15_000.0, 0.0, -15_000.0));
    if let Some(m) = world.get_mut(moon) {
        m.mass = MOON_MASS;
        m.velocity = Vec3::new(-45.71, 0.0, -45.71);
        m.orbit_parent = Some(planet);
    }

    let pad_top = Vec3::new(0.0, PLANET_RADIUS + 0.7, 0.0);
    let pad = body(world, GeometryKind::Box, 0.7, ShaderTag::Pad, Vec3::splat(0.5));
    world.translate(pad, pad_top - Vec3::new(0.0, 0.99, 0.0));

    let rocket_id = body(
        world,
        GeometryKind::Rocket,
        rocket.size,
        ShaderTag::Ship,
        Vec3::new(0.0, 1.0, 1.0),
    );
    world.translate(rocket_id, pad_top);
    if let Some(r) = world.get_mut(rocket_id) {
        r.mass = rocket.mass;
    }

    let spawn_point = world.spawn_node();
    world.translate(spawn_point, Vec3::new(0.0, -(rocket.size + rocket.particle_size()), 0.0));
    attach(world, spawn_point, rocket_id);

    let controller = RocketController::new(rocket, script, planet, PLANET_RADIUS).with_spawn_point(spawn_point);
    world.set_behavior(rocket_id, Some(Box::new(controller)));

    let sky = body(world, GeometryKind::Box, SKY_SIZE, ShaderTag::Sky, Vec3::ONE);
    world.rotate_y(sky, PI / 1.4);
    world.set_behavior(sky, Some(Box::new(Follow { target: rocket_id })));

    let camera = world.spawn_node();
    world.rotate_x(camera, -0.29);
    world.rotate_y(camera, -0.29);
    world.set_behavior(camera, Some(Box::new(OrbitCamera::new(rocket_id))));

    world.finalize_transforms();
    tracing::info!(entities = world.entity_count(), "demo scene built");

    DemoScene {
        origin,
        sun,
        halo,
        planet,
        moon,
        pad,
        rocket: rocket_id,
        spawn_point,
        sky,
        camera,
    }
}
