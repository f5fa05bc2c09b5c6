use glam::{Mat4, Vec3};
use orbital_common::EntityId;
use orbital_input::MouseButton;
use orbital_kernel::{Behavior, TickContext};

/// Mouse-driven chase camera orbiting a target.
///
/// Sits on the target's world position every tick. Dragging with the left
/// button turns it, dragging with the right button zooms. The resulting view
/// matrix is published on the simulation context.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: EntityId,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians per pixel per second of drag.
    pub turn_rate: f32,
    /// Zoom speed; scaled by the current distance so far zoom stays usable.
    pub zoom_rate: f32,
}

impl OrbitCamera {
    pub fn new(target: EntityId) -> Self {
        Self {
            target,
            distance: 3.0,
            min_distance: 1.2,
            max_distance: 95_000.0,
            turn_rate: 0.3,
            zoom_rate: 3.0,
        }
    }

    /// View matrix for a camera node with world transform `model`.
    pub fn view_matrix(&self, model: Mat4) -> Mat4 {
        (model * Mat4::from_translation(Vec3::new(0.0, 0.0, self.distance))).inverse()
    }
}

impl Behavior for OrbitCamera {
    fn on_tick(&mut self, cx: &mut TickContext<'_>) {
        let dt = cx.time.dt;
        let delta = cx.input.pointer_delta;

        if cx.input.button_held(MouseButton::Left) {
            cx.world.rotate_y(cx.entity, -delta.x * dt * self.turn_rate);
            cx.world.rotate_x(cx.entity, -delta.y * dt * self.turn_rate);
        }
        if cx.input.button_held(MouseButton::Right) {
            self.distance += delta.y * dt * self.zoom_rate * (self.distance / 10.0);
        }
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        if let Some(position) = cx.world.world_position(self.target) {
            cx.world.set_position(cx.entity, position);
        }
        if let Some(model) = cx.world.world_transform(cx.entity) {
            cx.sim.view = self.view_matrix(model);
        }
    }
}
