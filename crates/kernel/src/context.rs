use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the gravitational acceleration on a body is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GravityLaw {
    /// `G * M * m / d^2`: the attracted body's mass scales its own
    /// acceleration. The demo scene is tuned for this.
    #[default]
    Scaled,
    /// `G * M / d^2`.
    Newtonian,
}

/// Simulation configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Tunable gravitational constant; the scene is scaled for visual effect.
    pub gravitational_constant: f32,
    pub gravity_law: GravityLaw,
    /// Simulated seconds per physics sub-step.
    pub physics_dt: f32,
    /// Wall-clock tick rate of the driver. Does not affect simulated time.
    pub tick_rate_hz: f32,
    /// Physics sub-steps per tick.
    pub time_scale: u32,
    pub max_time_scale: u32,
    /// Seed for the effects RNG (particle jitter).
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: 6.6726e-5,
            gravity_law: GravityLaw::Scaled,
            physics_dt: 1.0 / 45.0,
            tick_rate_hz: 60.0,
            time_scale: 1,
            max_time_scale: 1000,
            seed: 0x5eed,
        }
    }
}

/// Errors from loading a [`SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl SimConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.physics_dt.is_finite() && self.physics_dt > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics_dt must be positive, got {}",
                self.physics_dt
            )));
        }
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_rate_hz must be positive, got {}",
                self.tick_rate_hz
            )));
        }
        if !self.gravitational_constant.is_finite() {
            return Err(ConfigError::Invalid("gravitational_constant must be finite".into()));
        }
        if self.max_time_scale == 0 || self.time_scale == 0 || self.time_scale > self.max_time_scale {
            return Err(ConfigError::Invalid(format!(
                "time_scale must be in 1..={}, got {}",
                self.max_time_scale, self.time_scale
            )));
        }
        Ok(())
    }
}

/// Mutable per-simulation state shared with behaviors.
///
/// Lives on the simulation rather than in process-wide globals, so several
/// simulations can coexist.
#[derive(Debug, Clone)]
pub struct SimContext {
    pub config: SimConfig,
    /// Set when the simulation froze (collision with the attractor).
    pub halted: bool,
    /// Physics sub-steps per tick.
    pub time_scale: u32,
    pub audio_muted: bool,
    /// View matrix published by the active camera.
    pub view: Mat4,
    rng: u64,
}

impl SimContext {
    pub fn new(config: SimConfig) -> Self {
        let time_scale = config.time_scale.clamp(1, config.max_time_scale.max(1));
        let rng = config.seed;
        Self {
            config,
            halted: false,
            time_scale,
            audio_muted: false,
            view: Mat4::IDENTITY,
            rng,
        }
    }

    /// Freeze the simulation.
    pub fn halt(&mut self, reason: &str) {
        if !self.halted {
            tracing::info!(reason, "simulation halted");
        }
        self.halted = true;
    }

    pub fn double_time_scale(&mut self) {
        self.set_time_scale(self.time_scale.saturating_mul(2));
    }

    pub fn halve_time_scale(&mut self) {
        self.set_time_scale(self.time_scale / 2);
    }

    /// Clamped to `1..=max_time_scale`.
    pub fn set_time_scale(&mut self, scale: u32) {
        let scale = scale.clamp(1, self.config.max_time_scale.max(1));
        if scale != self.time_scale {
            tracing::info!(from = self.time_scale, to = scale, "time scale changed");
        }
        self.time_scale = scale;
    }

    /// Uniform sample in `[0, 1)`. Deterministic for a given seed.
    pub fn random(&mut self) -> f32 {
        (splitmix64(&mut self.rng) >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform sample in `[low, high)`.
    pub fn random_range(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.random()
    }
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

/// One splitmix64 step.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
