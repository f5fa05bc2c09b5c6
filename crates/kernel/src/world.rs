use glam::{Mat4, Quat, Vec3};
use orbital_common::{Appearance, EntityId, GeometryKind};
use std::collections::BTreeMap;

use crate::behavior::Behavior;
use crate::entity::Entity;

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}

/// The scene graph: a forest of entities with lazily resolved world transforms.
///
/// Mutations mark the changed entity and its descendants dirty. Reads resolve
/// the dirty chain from the nearest clean ancestor down to the entity, so a
/// read costs the depth of the stale chain, never the whole tree.
///
/// Entities are kept in a BTreeMap keyed by monotonically assigned ids, which
/// makes iteration order equal to insertion order.
#[derive(Debug, Default)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    /// Spawned since the render layer last drained them.
    added: Vec<EntityId>,
    /// Despawned after the render layer observed them.
    removed: Vec<EntityId>,
    recomputes: u64,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Live entity ids in insertion order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access to physical state and render metadata.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Spawn an entity with the given geometry and an optional behavior.
    pub fn spawn(
        &mut self,
        geometry: Option<GeometryKind>,
        size: f32,
        behavior: Option<Box<dyn Behavior>>,
    ) -> EntityId {
        self.spawn_with(Appearance::new(geometry, size), behavior)
    }

    /// Spawn an invisible node (pivot, camera, attachment point).
    pub fn spawn_node(&mut self) -> EntityId {
        self.spawn_with(Appearance::default(), None)
    }

    /// Spawn an entity with a full appearance. Always succeeds.
    pub fn spawn_with(
        &mut self,
        appearance: Appearance,
        behavior: Option<Box<dyn Behavior>>,
    ) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, appearance, behavior));
        self.added.push(id);
        tracing::debug!(entity = %id, geometry = ?appearance.geometry, "spawned");
        id
    }

    /// Remove an entity. Returns false if it was not live.
    ///
    /// Children are detached to the root level first, keeping their world
    /// transforms, so no live entity is left pointing at a dead parent.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let Some(children) = self.entities.get(&id).map(|e| e.children.clone()) else {
            return false;
        };
        for child in children {
            if let Err(err) = self.set_parent(child, None) {
                tracing::warn!(entity = %id, %err, "failed to detach child on despawn");
            }
        }

        let Some(entity) = self.entities.remove(&id) else {
            return false;
        };
        if let Some(parent) = entity.parent.and_then(|p| self.entities.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }

        // never observed by the render layer: nothing to release
        if let Some(index) = self.added.iter().position(|a| *a == id) {
            self.added.remove(index);
        } else {
            self.removed.push(id);
        }
        tracing::debug!(entity = %id, "despawned");
        true
    }

    /// Replace an entity's behavior.
    pub fn set_behavior(&mut self, id: EntityId, behavior: Option<Box<dyn Behavior>>) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.behavior = behavior;
                true
            }
            None => false,
        }
    }

    pub(crate) fn take_behavior(&mut self, id: EntityId) -> Option<Box<dyn Behavior>> {
        self.entities.get_mut(&id)?.behavior.take()
    }

    /// Put a behavior back after its tick, unless the entity died or the
    /// behavior replaced itself meanwhile.
    pub(crate) fn restore_behavior(&mut self, id: EntityId, behavior: Box<dyn Behavior>) {
        if let Some(entity) = self.entities.get_mut(&id) {
            if entity.behavior.is_none() {
                entity.behavior = Some(behavior);
            }
        }
    }

    /// Re-parent an entity, or detach it to the root level with `None`.
    ///
    /// Detaching recomputes the local position and rotation from the current
    /// world transform, so the entity does not move at the moment of
    /// detachment. Attaching keeps the local transform, which now becomes
    /// relative to the new parent.
    ///
    /// # Panics
    /// If `parent` is `id` itself or one of its descendants.
    pub fn set_parent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<(), SceneError> {
        let current = self
            .entities
            .get(&id)
            .ok_or(SceneError::EntityNotFound(id))?
            .parent;
        if let Some(p) = parent {
            if !self.entities.contains_key(&p) {
                return Err(SceneError::EntityNotFound(p));
            }
            assert!(
                !self.is_ancestor_or_self(id, p),
                "parenting {id} under {p} would create a cycle"
            );
        }
        if current == parent {
            return Ok(());
        }

        if let Some(old) = current {
            let world = self.resolve(id).unwrap_or(Mat4::IDENTITY);
            let (_, rotation, translation) = world.to_scale_rotation_translation();
            if let Some(old_parent) = self.entities.get_mut(&old) {
                old_parent.children.retain(|c| *c != id);
            }
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.parent = None;
                entity.position = translation;
                entity.rotation = rotation.normalize();
            }
        }

        if let Some(new) = parent {
            if let Some(new_parent) = self.entities.get_mut(&new) {
                new_parent.children.push(id);
            }
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.parent = Some(new);
            }
        }

        self.mark_dirty(id);
        tracing::debug!(entity = %id, from = ?current, to = ?parent, "reparented");
        Ok(())
    }

    /// Move an entity by `delta` in its parent's space.
    pub fn translate(&mut self, id: EntityId, delta: Vec3) -> bool {
        self.mutate(id, |e| e.position += delta)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        self.mutate(id, |e| e.position = position)
    }

    pub fn set_rotation(&mut self, id: EntityId, rotation: Quat) -> bool {
        self.mutate(id, |e| e.rotation = rotation.normalize())
    }

    /// Rotate about the entity's own X axis.
    pub fn rotate_x(&mut self, id: EntityId, radians: f32) -> bool {
        self.mutate(id, |e| e.rotation = (e.rotation * Quat::from_rotation_x(radians)).normalize())
    }

    /// Rotate about the entity's own Y axis.
    pub fn rotate_y(&mut self, id: EntityId, radians: f32) -> bool {
        self.mutate(id, |e| e.rotation = (e.rotation * Quat::from_rotation_y(radians)).normalize())
    }

    /// Rotate about the entity's own Z axis.
    pub fn rotate_z(&mut self, id: EntityId, radians: f32) -> bool {
        self.mutate(id, |e| e.rotation = (e.rotation * Quat::from_rotation_z(radians)).normalize())
    }

    /// World-space position, resolving stale transforms first.
    pub fn world_position(&mut self, id: EntityId) -> Option<Vec3> {
        self.resolve(id).map(|m| m.w_axis.truncate())
    }

    /// World-space transform, resolving stale transforms first.
    pub fn world_transform(&mut self, id: EntityId) -> Option<Mat4> {
        self.resolve(id)
    }

    /// The cached world transform, only if it is up to date.
    pub fn finalized_transform(&self, id: EntityId) -> Option<Mat4> {
        self.entities
            .get(&id)
            .filter(|e| !e.dirty)
            .map(|e| e.world)
    }

    /// Resolve every stale transform. Run once per tick before rendering.
    pub fn finalize_transforms(&mut self) {
        let stale: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.dirty)
            .map(|e| e.id)
            .collect();
        for id in stale {
            self.resolve(id);
        }
    }

    /// Number of world-matrix recomputations performed so far.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Take the entities spawned since the last drain.
    pub fn drain_added(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.added)
    }

    /// Take the entities despawned since the last drain.
    pub fn drain_removed(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.removed)
    }

    pub fn added(&self) -> &[EntityId] {
        &self.added
    }

    pub fn removed(&self) -> &[EntityId] {
        &self.removed
    }

    fn mutate(&mut self, id: EntityId, f: impl FnOnce(&mut Entity)) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        f(entity);
        self.mark_dirty(id);
        true
    }

    /// Mark an entity and its descendants dirty.
    ///
    /// A dirty entity always has dirty descendants, so an already dirty
    /// branch is skipped.
    fn mark_dirty(&mut self, id: EntityId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(entity) = self.entities.get_mut(&current) else {
                continue;
            };
            if entity.dirty {
                continue;
            }
            entity.dirty = true;
            stack.extend(entity.children.iter().copied());
        }
    }

    /// Recompute the world transform of `id` and of its stale ancestors.
    fn resolve(&mut self, id: EntityId) -> Option<Mat4> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(entity) = self.entities.get(&current) else {
                break;
            };
            if !entity.dirty {
                break;
            }
            chain.push(current);
            cursor = entity.parent;
        }

        for current in chain.into_iter().rev() {
            let parent_world = self
                .entities
                .get(&current)
                .and_then(|e| e.parent)
                .and_then(|p| self.entities.get(&p))
                .map(|p| p.world);
            if let Some(entity) = self.entities.get_mut(&current) {
                entity.local = Mat4::from_rotation_translation(entity.rotation, entity.position);
                entity.world = match parent_world {
                    Some(parent) => parent * entity.local,
                    None => entity.local,
                };
                entity.dirty = false;
                self.recomputes += 1;
            }
        }

        self.entities.get(&id).map(|e| e.world)
    }

    fn is_ancestor_or_self(&self, ancestor: EntityId, node: EntityId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.entities.get(&current).and_then(|e| e.parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-4;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.entity_count(), 0);
        assert!(w.added().is_empty());
        assert_eq!(w.recompute_count(), 0);
    }

    #[test]
    fn spawn_assigns_monotonic_ids_and_registers_added() {
        let mut w = World::new();
        let a = w.spawn(Some(GeometryKind::Sphere), 1.0, None);
        let b = w.spawn_node();
        assert!(a < b);
        assert_eq!(w.added(), &[a, b]);
        assert_eq!(w.ids(), vec![a, b]);

        let e = w.get(a).unwrap();
        assert_eq!(e.position(), Vec3::ZERO);
        assert_eq!(e.rotation(), Quat::IDENTITY);
        assert!(e.is_dirty());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut w = World::new();
        let a = w.spawn_node();
        w.despawn(a);
        let b = w.spawn_node();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn despawn_unobserved_entity_skips_removed_set() {
        let mut w = World::new();
        let id = w.spawn_node();
        assert!(w.despawn(id));
        assert!(w.added().is_empty());
        assert!(w.removed().is_empty());
        assert!(!w.despawn(id));
    }

    #[test]
    fn despawn_observed_entity_enqueues_removal() {
        let mut w = World::new();
        let id = w.spawn_node();
        assert_eq!(w.drain_added(), vec![id]);
        assert!(w.despawn(id));
        assert_eq!(w.drain_removed(), vec![id]);
        assert!(w.removed().is_empty());
        assert_eq!(w.entity_count(), 0);
    }

    #[test]
    fn world_transform_composes_parent_and_local() {
        let mut w = World::new();
        let parent = w.spawn_node();
        let child = w.spawn_node();
        w.set_parent(child, Some(parent)).unwrap();
        w.translate(parent, Vec3::new(10.0, 0.0, 0.0));
        w.rotate_y(parent, FRAC_PI_2);
        w.translate(child, Vec3::new(1.0, 0.0, 0.0));

        let pos = w.world_position(child).unwrap();
        assert!(approx(pos, Vec3::new(10.0, 0.0, -1.0)), "{pos}");

        let expected = w.world_transform(parent).unwrap()
            * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        assert!(w.world_transform(child).unwrap().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn rotations_compose_about_local_axes() {
        let mut w = World::new();
        let id = w.spawn_node();
        w.rotate_z(id, FRAC_PI_2);
        w.rotate_x(id, FRAC_PI_2);
        let expected = Quat::from_rotation_z(FRAC_PI_2) * Quat::from_rotation_x(FRAC_PI_2);
        assert!(w.get(id).unwrap().rotation().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn detaching_preserves_world_position() {
        let mut w = World::new();
        let parent = w.spawn_node();
        let child = w.spawn_node();
        w.set_parent(child, Some(parent)).unwrap();
        w.set_position(parent, Vec3::new(0.0, 5.0, 0.0));
        w.rotate_z(parent, 0.7);
        w.translate(child, Vec3::new(2.0, 0.0, 1.0));

        let before = w.world_transform(child).unwrap();
        w.set_parent(child, None).unwrap();
        let after = w.world_transform(child).unwrap();

        assert!(approx(before.w_axis.truncate(), after.w_axis.truncate()));
        assert!(before.abs_diff_eq(after, EPS));
        assert_eq!(w.get(child).unwrap().parent(), None);
        assert!(w.get(parent).unwrap().children().is_empty());
    }

    #[test]
    fn attaching_keeps_local_transform() {
        let mut w = World::new();
        let parent = w.spawn_node();
        let child = w.spawn_node();
        w.set_position(parent, Vec3::new(3.0, 0.0, 0.0));
        w.set_position(child, Vec3::new(0.0, 1.0, 0.0));
        w.set_parent(child, Some(parent)).unwrap();

        assert_eq!(w.get(child).unwrap().position(), Vec3::new(0.0, 1.0, 0.0));
        assert!(approx(w.world_position(child).unwrap(), Vec3::new(3.0, 1.0, 0.0)));
        assert_eq!(w.get(parent).unwrap().children(), &[child]);
    }

    #[test]
    fn moving_between_parents_detaches_first() {
        let mut w = World::new();
        let a = w.spawn_node();
        let b = w.spawn_node();
        let child = w.spawn_node();
        w.set_position(a, Vec3::new(1.0, 0.0, 0.0));
        w.set_position(b, Vec3::new(0.0, 0.0, 7.0));
        w.set_parent(child, Some(a)).unwrap();
        w.set_parent(child, Some(b)).unwrap();

        // world position under `a` became the local offset under `b`
        assert!(approx(w.get(child).unwrap().position(), Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(w.world_position(child).unwrap(), Vec3::new(1.0, 0.0, 7.0)));
        assert!(w.get(a).unwrap().children().is_empty());
        assert_eq!(w.get(b).unwrap().children(), &[child]);
    }

    #[test]
    fn set_parent_unknown_entity_is_an_error() {
        let mut w = World::new();
        let id = w.spawn_node();
        assert!(matches!(
            w.set_parent(id, Some(EntityId(99))),
            Err(SceneError::EntityNotFound(EntityId(99)))
        ));
        assert!(w.set_parent(EntityId(42), None).is_err());
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn parenting_under_a_descendant_panics() {
        let mut w = World::new();
        let root = w.spawn_node();
        let child = w.spawn_node();
        w.set_parent(child, Some(root)).unwrap();
        let _ = w.set_parent(root, Some(child));
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn parenting_under_self_panics() {
        let mut w = World::new();
        let id = w.spawn_node();
        let _ = w.set_parent(id, Some(id));
    }

    #[test]
    fn despawn_detaches_children_in_place() {
        let mut w = World::new();
        let parent = w.spawn_node();
        let child = w.spawn_node();
        w.set_parent(child, Some(parent)).unwrap();
        w.set_position(parent, Vec3::new(4.0, 4.0, 0.0));
        w.translate(child, Vec3::X);
        let before = w.world_position(child).unwrap();

        w.despawn(parent);
        assert_eq!(w.get(child).unwrap().parent(), None);
        assert!(approx(w.world_position(child).unwrap(), before));
    }

    #[test]
    fn despawn_unlinks_from_parent() {
        let mut w = World::new();
        let parent = w.spawn_node();
        let child = w.spawn_node();
        w.set_parent(child, Some(parent)).unwrap();
        w.despawn(child);
        assert!(w.get(parent).unwrap().children().is_empty());
    }

    #[test]
    fn mutating_root_dirties_all_descendants() {
        let mut w = World::new();
        let root = w.spawn_node();
        let a = w.spawn_node();
        let b = w.spawn_node();
        let c = w.spawn_node();
        w.set_parent(a, Some(root)).unwrap();
        w.set_parent(b, Some(a)).unwrap();
        w.set_parent(c, Some(root)).unwrap();
        w.finalize_transforms();
        assert!(w.iter().all(|e| !e.is_dirty()));

        w.rotate_y(root, 0.3);
        for id in [root, a, b, c] {
            assert!(w.get(id).unwrap().is_dirty());
            assert!(w.finalized_transform(id).is_none());
        }
    }

    #[test]
    fn reading_a_descendant_recomputes_only_its_chain() {
        let mut w = World::new();
        let root = w.spawn_node();
        let a = w.spawn_node();
        let b = w.spawn_node();
        let sibling = w.spawn_node();
        w.set_parent(a, Some(root)).unwrap();
        w.set_parent(b, Some(a)).unwrap();
        w.set_parent(sibling, Some(root)).unwrap();
        w.finalize_transforms();

        w.rotate_x(root, 1.0);
        let before = w.recompute_count();
        w.world_position(b).unwrap();
        assert_eq!(w.recompute_count() - before, 3); // root, a, b
        assert!(w.get(sibling).unwrap().is_dirty());

        // clean reads are free
        w.world_position(b).unwrap();
        assert_eq!(w.recompute_count() - before, 3);
    }

    #[test]
    fn mutation_cost_is_bounded_by_changed_subtree() {
        let mut w = World::new();
        let root = w.spawn_node();
        let left = w.spawn_node();
        let right = w.spawn_node();
        w.set_parent(left, Some(root)).unwrap();
        w.set_parent(right, Some(root)).unwrap();
        w.finalize_transforms();

        w.translate(left, Vec3::Y);
        assert!(w.get(left).unwrap().is_dirty());
        assert!(!w.get(root).unwrap().is_dirty());
        assert!(!w.get(right).unwrap().is_dirty());

        let before = w.recompute_count();
        w.finalize_transforms();
        assert_eq!(w.recompute_count() - before, 1);
    }

    #[test]
    fn finalized_transform_available_after_finalize() {
        let mut w = World::new();
        let id = w.spawn_node();
        w.set_position(id, Vec3::new(1.0, 2.0, 3.0));
        assert!(w.finalized_transform(id).is_none());
        w.finalize_transforms();
        let m = w.finalized_transform(id).unwrap();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn mutators_report_unknown_entities() {
        let mut w = World::new();
        let ghost = EntityId(7);
        assert!(!w.translate(ghost, Vec3::X));
        assert!(!w.rotate_y(ghost, 1.0));
        assert!(w.world_position(ghost).is_none());
    }
}
