use glam::{Mat4, Vec3};
use orbital_common::{Appearance, EntityId};
use orbital_kernel::Simulation;

/// Entities whose positions the shaders need every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameAnchors {
    /// Light source.
    pub sun: Option<EntityId>,
    /// The entity the camera chases.
    pub player: Option<EntityId>,
}

/// A visible entity as the render layer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub entity: EntityId,
    pub transform: Mat4,
    pub appearance: Appearance,
}

/// Read-only snapshot of everything a backend needs for one frame.
///
/// Captured after the tick's updates completed, so every transform in it is
/// final. Lifecycle sets are handed over exactly once: the next capture only
/// sees entities added or removed since this one.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub tick: u64,
    pub elapsed: f64,
    pub time_scale: u32,
    pub halted: bool,
    pub view: Mat4,
    pub sun_position: Option<Vec3>,
    pub player_position: Option<Vec3>,
    pub added: Vec<EntityId>,
    pub removed: Vec<EntityId>,
    /// Ordered by entity id.
    pub drawables: Vec<Drawable>,
}

impl RenderFrame {
    pub fn capture(sim: &mut Simulation, anchors: FrameAnchors) -> Self {
        let world = &mut sim.world;
        world.finalize_transforms();

        let sun_position = anchors.sun.and_then(|id| world.world_position(id));
        let player_position = anchors.player.and_then(|id| world.world_position(id));
        let added = world.drain_added();
        let removed = world.drain_removed();

        let world = &*world;
        let drawables = world
            .iter()
            .filter(|e| e.appearance.is_visible())
            .filter_map(|e| {
                let transform = world.finalized_transform(e.id())?;
                Some(Drawable {
                    entity: e.id(),
                    transform,
                    appearance: e.appearance,
                })
            })
            .collect();

        Self {
            tick: sim.ticks(),
            elapsed: sim.elapsed(),
            time_scale: sim.context.time_scale,
            halted: sim.is_halted(),
            view: sim.context.view,
            sun_position,
            player_position,
            added,
            removed,
            drawables,
        }
    }

    pub fn drawable(&self, id: EntityId) -> Option<&Drawable> {
        self.drawables
            .binary_search_by_key(&id, |d| d.entity)
            .ok()
            .map(|i| &self.drawables[i])
    }
}
