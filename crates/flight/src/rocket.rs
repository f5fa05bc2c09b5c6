use glam::{Vec2, Vec3};
use orbital_common::{Appearance, EntityId, GeometryKind, ShaderTag};
use orbital_input::Key;
use orbital_kernel::{Behavior, TickContext};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f32::consts::TAU;

use crate::script::{Axis, FlightAction, FlightScript, ScriptCursor};

/// Tunables for the rocket and its exhaust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocketConfig {
    pub size: f32,
    pub mass: f32,
    /// Acceleration along the rocket's local +Y while thrusting.
    pub thrust_acceleration: f32,
    /// Launch on the first tick instead of waiting for a key press.
    pub auto_launch: bool,
    /// Seconds after launch before the ground check arms.
    pub ground_check_delay: f64,
    pub max_particles: usize,
    /// Minimum seconds between two exhaust particles.
    pub particle_interval: f64,
    pub particle_lifetime: f64,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            size: 0.5,
            mass: 2000.0,
            thrust_acceleration: 2.4,
            auto_launch: false,
            ground_check_delay: 1.0,
            max_particles: 25,
            particle_interval: 0.01,
            particle_lifetime: 0.25,
        }
    }
}

impl RocketConfig {
    pub fn particle_size(&self) -> f32 {
        self.size * 0.25
    }
}

/// Where the rocket is in its flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightPhase {
    /// On the pad, waiting for the launch trigger.
    Idle,
    /// Script running; `started_at` is the simulated launch time.
    Flying { started_at: f64 },
    /// Came down on the attractor; the simulation is frozen.
    Halted,
}

/// Flight computer of the player rocket.
///
/// Waits on the pad until launch, then plays its script: each step applies
/// once the flight time reaches it, in order, never replayed. Thrust pushes
/// along the rocket's local +Y and sheds exhaust particles. Falling back to
/// the attractor's radius halts the simulation.
#[derive(Debug)]
pub struct RocketController {
    config: RocketConfig,
    cursor: ScriptCursor,
    phase: FlightPhase,
    thrust: bool,
    rotation: Option<(Axis, f32)>,
    attractor: EntityId,
    attractor_radius: f32,
    spawn_point: Option<EntityId>,
    particles: VecDeque<(EntityId, f64)>,
    last_particle_at: f64,
}

impl RocketController {
    pub fn new(
        config: RocketConfig,
        script: FlightScript,
        attractor: EntityId,
        attractor_radius: f32,
    ) -> Self {
        Self {
            config,
            cursor: ScriptCursor::new(script),
            phase: FlightPhase::Idle,
            thrust: false,
            rotation: None,
            attractor,
            attractor_radius,
            spawn_point: None,
            particles: VecDeque::new(),
            last_particle_at: 0.0,
        }
    }

    /// Attach exhaust particles to this node instead of the rocket itself.
    pub fn with_spawn_point(mut self, spawn_point: EntityId) -> Self {
        self.spawn_point = Some(spawn_point);
        self
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn is_thrusting(&self) -> bool {
        self.thrust
    }

    pub fn live_particles(&self) -> usize {
        self.particles.len()
    }

    fn launch(&mut self, cx: &mut TickContext<'_>) {
        let t = cx.time.t;
        self.phase = FlightPhase::Flying { started_at: t };
        self.thrust = false;
        self.rotation = None;
        self.last_particle_at = 0.0;
        if let Some(rocket) = cx.world.get_mut(cx.entity) {
            rocket.orbit_parent = Some(self.attractor);
        }
        tracing::info!(entity = %cx.entity, t, "launch");
    }

    fn apply(&mut self, action: FlightAction, flight_time: f64) {
        tracing::info!(?action, flight_time, "flight script step");
        match action {
            FlightAction::Thrust => self.thrust = true,
            FlightAction::Cut => self.thrust = false,
            FlightAction::Rotate { axis, rads_per_sec } => self.rotation = Some((axis, rads_per_sec)),
            FlightAction::StopRotate => self.rotation = None,
        }
    }

    fn fire_engine(&mut self, cx: &mut TickContext<'_>) {
        let dt = cx.time.dt;
        if let Some(rocket) = cx.world.get_mut(cx.entity) {
            let push = rocket.rotation() * Vec3::new(0.0, self.config.thrust_acceleration * dt, 0.0);
            rocket.velocity += push;
        }

        let t = cx.time.t;
        if t > self.last_particle_at + self.config.particle_interval
            && self.particles.len() < self.config.max_particles
        {
            let particle = self.spawn_particle(cx);
            self.particles.push_back((particle, t));
            self.last_particle_at = t;
        }
    }

    fn spawn_particle(&self, cx: &mut TickContext<'_>) -> EntityId {
        let size = self.config.size;
        let spread = size * 0.2;
        let jitter = Vec2::new(
            cx.sim.random_range(-spread, spread),
            cx.sim.random_range(-spread, spread),
        );
        let tumble = Vec3::new(
            cx.sim.random_range(0.0, TAU),
            cx.sim.random_range(0.0, TAU),
            cx.sim.random_range(0.0, TAU),
        );

        let appearance = Appearance {
            geometry: Some(GeometryKind::Triangle),
            size: self.config.particle_size(),
            shader: ShaderTag::Particle,
            color: Vec3::ZERO,
            shared_geometry: true,
        };
        let world = &mut *cx.world;
        let id = world.spawn_with(appearance, Some(Box::new(ExhaustParticle { jitter })));
        world.translate(id, Vec3::new(jitter.x * 0.4, 0.0, jitter.y * 0.4));
        world.rotate_x(id, tumble.x);
        world.rotate_y(id, tumble.y);
        world.rotate_z(id, tumble.z);
        let anchor = self.spawn_point.unwrap_or(cx.entity);
        if let Err(err) = world.set_parent(id, Some(anchor)) {
            tracing::warn!(%err, "exhaust anchor missing");
        }
        id
    }

    fn expire_particles(&mut self, cx: &mut TickContext<'_>) {
        let lifetime = self.config.particle_lifetime;
        let t = cx.time.t;
        self.particles.retain(|&(id, created_at)| {
            if t > created_at + lifetime {
                cx.world.despawn(id);
                false
            } else {
                true
            }
        });
    }
}

impl Behavior for RocketController {
    fn on_tick(&mut self, cx: &mut TickContext<'_>) {
        let t = cx.time.t;
        let started_at = match self.phase {
            FlightPhase::Halted => return,
            FlightPhase::Idle => {
                if !(self.config.auto_launch || cx.input.was_pressed(Key::Space)) {
                    return;
                }
                self.launch(cx);
                t
            }
            FlightPhase::Flying { started_at } => started_at,
        };

        if t > started_at + self.config.ground_check_delay {
            let altitude = cx.world.world_position(cx.entity).map(Vec3::length);
            if altitude.is_some_and(|a| a <= self.attractor_radius) {
                self.phase = FlightPhase::Halted;
                self.thrust = false;
                cx.sim.halt("rocket hit the attractor");
                return;
            }
        }

        let flight_time = t - started_at;
        while let Some(action) = self.cursor.pop_due(flight_time) {
            self.apply(action, flight_time);
        }

        if self.thrust {
            self.fire_engine(cx);
        }
        self.expire_particles(cx);

        if let Some((axis, rate)) = self.rotation {
            let angle = rate * cx.time.dt;
            match axis {
                Axis::X => cx.world.rotate_x(cx.entity, angle),
                Axis::Y => cx.world.rotate_y(cx.entity, angle),
                Axis::Z => cx.world.rotate_z(cx.entity, angle),
            };
        }
    }
}

/// Exhaust particle: tumbles and drifts away from the nozzle.
#[derive(Debug, Clone, Copy)]
pub struct ExhaustParticle {
    jitter: Vec2,
}

impl Behavior for ExhaustParticle {
    fn on_tick(&mut self, cx: &mut TickContext<'_>) {
        let dt = cx.time.dt;
        let id = cx.entity;
        cx.world.rotate_x(id, dt * 500.0);
        cx.world.rotate_y(id, dt * 500.0);
        cx.world.rotate_z(id, dt * 500.0);
        cx.world
            .translate(id, Vec3::new(self.jitter.x * dt * 14.0, -dt * 3.0, self.jitter.y * dt * 14.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::FlightStep;
    use orbital_input::InputSnapshot;
    use orbital_kernel::{SimConfig, Simulation, TickTime};

    const DT: f32 = 0.1;

    struct Rig {
        sim: Simulation,
        rocket: EntityId,
        planet: EntityId,
    }

    fn rig(script: FlightScript, config: RocketConfig) -> Rig {
        let mut sim = Simulation::new(SimConfig {
            physics_dt: DT,
            ..SimConfig::default()
        });
        let planet = sim.world.spawn(Some(GeometryKind::Sphere), 10.0, None);
        sim.world.get_mut(planet).unwrap().mass = 1.0;
        let controller = RocketController::new(config, script, planet, 10.0);
        let rocket = sim
            .world
            .spawn(Some(GeometryKind::Rocket), 0.5, Some(Box::new(controller)));
        sim.world.set_position(rocket, Vec3::new(0.0, 11.0, 0.0));
        Rig { sim, rocket, planet }
    }

    fn thrust_window() -> FlightScript {
        FlightScript::new(vec![
            FlightStep { time: 2.0, action: FlightAction::Thrust },
            FlightStep { time: 5.0, action: FlightAction::Cut },
        ])
        .unwrap()
    }

    fn step(rig: &mut Rig, input: &InputSnapshot) -> Vec3 {
        let before = rig.sim.world.get(rig.rocket).unwrap().velocity;
        rig.sim.step_once(input);
        rig.sim.world.get(rig.rocket).unwrap().velocity - before
    }

    #[test]
    fn idle_until_space_is_pressed() {
        let mut rig = rig(thrust_window(), RocketConfig::default());
        for _ in 0..50 {
            step(&mut rig, &InputSnapshot::empty());
        }
        let rocket = rig.sim.world.get(rig.rocket).unwrap();
        assert_eq!(rocket.velocity, Vec3::ZERO);
        assert_eq!(rocket.orbit_parent, None);

        step(&mut rig, &InputSnapshot::with_pressed(&[Key::Space]));
        assert_eq!(rig.sim.world.get(rig.rocket).unwrap().orbit_parent, Some(rig.planet));
    }

    #[test]
    fn thrust_is_active_only_in_scripted_window() {
        let config = RocketConfig {
            auto_launch: true,
            thrust_acceleration: 1.0,
            ..RocketConfig::default()
        };
        let mut rig = rig(thrust_window(), config);
        // keep the rocket from being attracted so only thrust changes velocity
        rig.sim.world.get_mut(rig.planet).unwrap().mass = 0.0;

        let mut thrusting = Vec::new();
        for _ in 0..80 {
            let flight_time = rig.sim.elapsed();
            let dv = step(&mut rig, &InputSnapshot::empty());
            thrusting.push((flight_time, dv.y > 0.0));
        }

        for (flight_time, on) in thrusting {
            let expected = (2.0 - 1e-6..5.0 - 1e-6).contains(&flight_time);
            assert_eq!(on, expected, "flight time {flight_time}");
        }
    }

    #[test]
    fn thrust_follows_rocket_orientation() {
        let config = RocketConfig {
            auto_launch: true,
            thrust_acceleration: 1.0,
            ..RocketConfig::default()
        };
        let script = FlightScript::new(vec![FlightStep { time: 0.0, action: FlightAction::Thrust }]).unwrap();
        let mut rig = rig(script, config);
        rig.sim.world.get_mut(rig.planet).unwrap().mass = 0.0;
        rig.sim.world.rotate_z(rig.rocket, -std::f32::consts::FRAC_PI_2);

        let dv = step(&mut rig, &InputSnapshot::empty());
        assert!(dv.abs_diff_eq(Vec3::new(DT, 0.0, 0.0), 1e-5), "{dv}");
    }

    #[test]
    fn rotate_steps_turn_the_rocket() {
        let config = RocketConfig {
            auto_launch: true,
            ..RocketConfig::default()
        };
        let script = FlightScript::new(vec![
            FlightStep {
                time: 0.0,
                action: FlightAction::Rotate { axis: Axis::Z, rads_per_sec: 1.0 },
            },
            FlightStep { time: 0.5, action: FlightAction::StopRotate },
        ])
        .unwrap();
        let mut rig = rig(script, config);
        for _ in 0..20 {
            step(&mut rig, &InputSnapshot::empty());
        }
        let (axis, angle) = rig.sim.world.get(rig.rocket).unwrap().rotation().to_axis_angle();
        assert!((angle - 0.5).abs() < 1e-4, "{angle}");
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-4));
    }

    #[test]
    fn exhaust_particles_are_capped_and_expire() {
        let config = RocketConfig {
            auto_launch: true,
            max_particles: 3,
            particle_interval: 0.0,
            particle_lifetime: 0.35,
            ..RocketConfig::default()
        };
        let script = FlightScript::new(vec![
            FlightStep { time: 0.0, action: FlightAction::Thrust },
            FlightStep { time: 1.0, action: FlightAction::Cut },
        ])
        .unwrap();
        let mut rig = rig(script, config);
        rig.sim.world.get_mut(rig.planet).unwrap().mass = 0.0;
        let base = rig.sim.world.entity_count();

        for _ in 0..8 {
            step(&mut rig, &InputSnapshot::empty());
            assert!(rig.sim.world.entity_count() <= base + 3);
        }
        assert!(rig.sim.world.entity_count() > base);

        for _ in 0..10 {
            step(&mut rig, &InputSnapshot::empty());
        }
        assert_eq!(rig.sim.world.entity_count(), base);
    }

    #[test]
    fn particles_share_geometry_and_hang_off_the_rocket() {
        let config = RocketConfig {
            auto_launch: true,
            ..RocketConfig::default()
        };
        let script = FlightScript::new(vec![FlightStep { time: 0.0, action: FlightAction::Thrust }]).unwrap();
        let mut rig = rig(script, config);
        // the first exhaust puff waits one particle interval after ignition
        step(&mut rig, &InputSnapshot::empty());
        rig.sim.world.drain_added();
        step(&mut rig, &InputSnapshot::empty());

        let added = rig.sim.world.drain_added();
        assert_eq!(added.len(), 1);
        let particle = rig.sim.world.get(added[0]).unwrap();
        assert!(particle.appearance.shared_geometry);
        assert_eq!(particle.appearance.geometry, Some(GeometryKind::Triangle));
        assert_eq!(particle.parent(), Some(rig.rocket));
    }

    #[test]
    fn falling_below_attractor_radius_halts() {
        let config = RocketConfig {
            auto_launch: true,
            ..RocketConfig::default()
        };
        let mut rig = rig(FlightScript::default(), config);
        step(&mut rig, &InputSnapshot::empty());
        rig.sim.world.set_position(rig.rocket, Vec3::new(0.0, 9.0, 0.0));

        // ground check is disarmed during the first second of flight
        for _ in 0..9 {
            step(&mut rig, &InputSnapshot::empty());
        }
        assert!(!rig.sim.is_halted());
        step(&mut rig, &InputSnapshot::empty());
        assert!(rig.sim.is_halted());
    }

    #[test]
    fn launch_records_start_time() {
        let mut controller = RocketController::new(
            RocketConfig::default(),
            FlightScript::default(),
            EntityId(0),
            1.0,
        );
        let mut sim = Simulation::default();
        let id = sim.world.spawn_node();
        let input = InputSnapshot::with_pressed(&[Key::Space]);
        let mut cx = TickContext {
            entity: id,
            time: TickTime { t: 3.5, dt: 0.1 },
            input: &input,
            world: &mut sim.world,
            sim: &mut sim.context,
        };
        controller.on_tick(&mut cx);
        assert_eq!(controller.phase(), FlightPhase::Flying { started_at: 3.5 });
    }
}
