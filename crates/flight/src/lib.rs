//! The launch-to-orbit demo built on the simulation kernel: timed flight
//! scripts, the rocket controller with its exhaust, the chase camera and the
//! demo scene.

pub mod camera;
pub mod rocket;
pub mod scene;
pub mod script;

pub use camera::OrbitCamera;
pub use rocket::{ExhaustParticle, FlightPhase, RocketConfig, RocketController};
pub use scene::{build_demo_scene, DemoScene};
pub use script::{Axis, FlightAction, FlightScript, FlightStep, ScriptCursor, ScriptError};
