use orbital_input::{InputSnapshot, InputState, Key};

use crate::behavior::TickTime;
use crate::context::{SimConfig, SimContext};
use crate::physics;
use crate::world::World;

/// The fixed-rate simulation driver.
///
/// Owns the scene graph and the simulation context. One call to
/// [`Simulation::advance`] is one tick: `time_scale` physics sub-steps, each
/// with its own input snapshot, followed by transform finalization.
#[derive(Debug)]
pub struct Simulation {
    pub world: World,
    pub context: SimContext,
    steps: u64,
    ticks: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self {
            world: World::new(),
            context: SimContext::new(config),
            steps: 0,
            ticks: 0,
        }
    }

    /// Physics sub-steps run so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Ticks run so far, including halted ones.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds elapsed.
    pub fn elapsed(&self) -> f64 {
        self.steps as f64 * f64::from(self.context.config.physics_dt)
    }

    pub fn is_halted(&self) -> bool {
        self.context.halted
    }

    /// Run one tick. Returns the number of sub-steps run.
    ///
    /// The sub-step count is fixed at the start of the tick; a time-scale
    /// change takes effect on the next tick. A halt stops the remaining
    /// sub-steps, and a halted simulation does not advance at all.
    pub fn advance(&mut self, input: &mut InputState) -> u32 {
        self.ticks += 1;
        if self.context.halted {
            return 0;
        }
        let _span = tracing::info_span!("tick", tick = self.ticks).entered();

        let substeps = self.context.time_scale;
        let mut ran = 0;
        for _ in 0..substeps {
            if self.context.halted {
                break;
            }
            let snapshot = input.snapshot();
            self.step_once(&snapshot);
            ran += 1;
        }
        self.world.finalize_transforms();
        ran
    }

    /// Run a single physics sub-step with the given input.
    pub fn step_once(&mut self, input: &InputSnapshot) {
        if input.was_pressed(Key::Up) {
            self.context.double_time_scale();
        }
        if input.was_pressed(Key::Down) {
            self.context.halve_time_scale();
        }
        if input.was_pressed(Key::M) {
            self.context.audio_muted = !self.context.audio_muted;
        }

        let time = TickTime {
            t: self.elapsed(),
            dt: self.context.config.physics_dt,
        };
        physics::step(&mut self.world, &mut self.context, time, input);
        self.steps += 1;
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
