use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Local rotation axis of the rocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One scripted control input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FlightAction {
    /// Engine on.
    Thrust,
    /// Engine off.
    Cut,
    /// Start turning about `axis`.
    Rotate {
        axis: Axis,
        #[serde(alias = "radsPerSec")]
        rads_per_sec: f32,
    },
    #[serde(alias = "stopRotate")]
    StopRotate,
}

/// An action and the flight time (seconds after launch) it applies at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightStep {
    pub time: f64,
    #[serde(flatten)]
    pub action: FlightAction,
}

/// Errors from loading or validating a flight script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported script format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("step {index}: {reason}")]
    Invalid { index: usize, reason: String },
}

/// Ordered list of timed actions, applied front to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightScript {
    steps: Vec<FlightStep>,
}

impl FlightScript {
    /// Build a script, checking that times are finite, non-negative and
    /// non-decreasing.
    pub fn new(steps: Vec<FlightStep>) -> Result<Self, ScriptError> {
        let script = Self { steps };
        script.validate()?;
        Ok(script)
    }

    /// The launch-to-orbit route the demo flies: lift off, pitch over, cut
    /// the engine, then circularize with a short burn at apoapsis.
    pub fn default_route() -> Self {
        use FlightAction::*;
        let step = |time, action| FlightStep { time, action };
        Self {
            steps: vec![
                step(2.0, Thrust),
                step(50.0, Rotate { axis: Axis::Z, rads_per_sec: 0.5 }),
                step(53.0, StopRotate),
                step(85.0, Cut),
                step(310.0, Rotate { axis: Axis::Z, rads_per_sec: 0.2 }),
                step(325.0, StopRotate),
                step(325.0, Thrust),
                step(330.0, Cut),
            ],
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_yaml::from_str(text)?;
        script.validate()?;
        Ok(script)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_json::from_str(text)?;
        script.validate()?;
        Ok(script)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path)?;
        let script = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            _ => return Err(ScriptError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), steps = script.len(), "flight script loaded");
        Ok(script)
    }

    pub fn steps(&self) -> &[FlightStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn validate(&self) -> Result<(), ScriptError> {
        let mut previous = 0.0;
        for (index, step) in self.steps.iter().enumerate() {
            let invalid = |reason: String| ScriptError::Invalid { index, reason };
            if !step.time.is_finite() || step.time < 0.0 {
                return Err(invalid(format!("time must be a non-negative number, got {}", step.time)));
            }
            if step.time < previous {
                return Err(invalid(format!(
                    "time {} is earlier than the previous step at {previous}",
                    step.time
                )));
            }
            if let FlightAction::Rotate { rads_per_sec, .. } = step.action {
                if !rads_per_sec.is_finite() {
                    return Err(invalid("rads_per_sec must be finite".into()));
                }
            }
            previous = step.time;
        }
        Ok(())
    }
}

/// Read position in a script. Steps are consumed once and never replayed.
#[derive(Debug, Clone)]
pub struct ScriptCursor {
    script: FlightScript,
    next: usize,
}

impl ScriptCursor {
    pub fn new(script: FlightScript) -> Self {
        Self { script, next: 0 }
    }

    /// Consume the next step if it is due at `flight_time` seconds after launch.
    pub fn pop_due(&mut self, flight_time: f64) -> Option<FlightAction> {
        let step = self.script.steps.get(self.next)?;
        if flight_time < step.time {
            return None;
        }
        self.next += 1;
        Some(step.action)
    }

    pub fn remaining(&self) -> usize {
        self.script.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }
}
