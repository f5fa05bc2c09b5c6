use glam::{Mat4, Quat, Vec3};
use orbital_common::{Appearance, EntityId};

use crate::behavior::Behavior;

/// A node in the scene graph.
///
/// Spatial state and hierarchy links are only mutable through [`crate::World`]
/// so that every change marks the cached world transforms dirty. Physical
/// state and render metadata are plain fields.
#[derive(Debug)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) local: Mat4,
    pub(crate) world: Mat4,
    pub(crate) dirty: bool,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    /// Zero means massless: never attracts or is attracted.
    pub mass: f32,
    pub velocity: Vec3,
    /// Body whose mass attracts this one. Independent of the scene parent.
    pub orbit_parent: Option<EntityId>,
    pub appearance: Appearance,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        appearance: Appearance,
        behavior: Option<Box<dyn Behavior>>,
    ) -> Self {
        Self {
            id,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            local: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            dirty: true,
            parent: None,
            children: Vec::new(),
            behavior,
            mass: 0.0,
            velocity: Vec3::ZERO,
            orbit_parent: None,
            appearance,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Position relative to the scene parent.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Rotation relative to the scene parent.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Whether the cached world transform is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }
}
