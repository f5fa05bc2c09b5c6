use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Keys the simulation reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    /// Launch.
    Space,
    /// Double the time scale.
    Up,
    /// Halve the time scale.
    Down,
    /// Toggle audio.
    M,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
}

/// Immutable view of the input for one simulation sub-step.
///
/// Edge sets hold keys that went down (or up) since the previous snapshot,
/// so a press is observed by exactly one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Pointer motion accumulated while a button was held.
    pub pointer_delta: Vec2,
    pub buttons_held: BTreeSet<MouseButton>,
    pub keys_held: BTreeSet<Key>,
    pub pressed: BTreeSet<Key>,
    pub released: BTreeSet<Key>,
}

impl InputSnapshot {
    /// A snapshot with nothing held and nothing pressed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A snapshot where `keys` were pressed this tick (and are held).
    pub fn with_pressed(keys: &[Key]) -> Self {
        Self {
            keys_held: keys.iter().copied().collect(),
            pressed: keys.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn was_released(&self, key: Key) -> bool {
        self.released.contains(&key)
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn button_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }
}

/// Accumulates device events between snapshots.
///
/// Device wiring calls the event methods as events arrive; the simulation
/// driver calls [`InputState::snapshot`] once per sub-step.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pointer: Option<Vec2>,
    current: InputSnapshot,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer moved to an absolute position.
    ///
    /// Motion only accumulates into the delta while a button is held; the
    /// very first position report produces no delta.
    pub fn pointer_moved(&mut self, position: Vec2) {
        let last = self.pointer.replace(position);
        if self.current.buttons_held.is_empty() {
            return;
        }
        if let Some(last) = last {
            self.current.pointer_delta += position - last;
        }
    }

    pub fn button_down(&mut self, button: MouseButton) {
        self.current.buttons_held.insert(button);
    }

    pub fn button_up(&mut self, button: MouseButton) {
        self.current.buttons_held.remove(&button);
    }

    pub fn key_down(&mut self, key: Key) {
        self.current.keys_held.insert(key);
        self.current.pressed.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.current.keys_held.remove(&key);
        self.current.released.insert(key);
    }

    /// A tap: the next snapshot sees `key` pressed but not held.
    /// Used by scripted and headless drivers.
    pub fn press(&mut self, key: Key) {
        self.current.pressed.insert(key);
    }

    /// Take the input for one sub-step and reset deltas and edge sets.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snapshot = self.current.clone();
        self.current.pointer_delta = Vec2::ZERO;
        self.current.pressed.clear();
        self.current.released.clear();
        if !snapshot.pressed.is_empty() {
            tracing::trace!(pressed = ?snapshot.pressed, "input edges consumed");
        }
        snapshot
    }

    /// Peek at the accumulated state without consuming it.
    pub fn pending(&self) -> &InputSnapshot {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_edges_fire_exactly_once() {
        let mut input = InputState::new();
        input.key_down(Key::Space);

        let first = input.snapshot();
        assert!(first.was_pressed(Key::Space));
        assert!(first.is_held(Key::Space));

        let second = input.snapshot();
        assert!(!second.was_pressed(Key::Space));
        assert!(second.is_held(Key::Space));
    }

    #[test]
    fn release_clears_held_and_records_edge() {
        let mut input = InputState::new();
        input.key_down(Key::Up);
        input.snapshot();
        input.key_up(Key::Up);

        let snap = input.snapshot();
        assert!(!snap.is_held(Key::Up));
        assert!(snap.was_released(Key::Up));
        assert!(!input.snapshot().was_released(Key::Up));
    }

    #[test]
    fn pointer_delta_accumulates_only_while_button_held() {
        let mut input = InputState::new();
        input.pointer_moved(Vec2::new(10.0, 10.0));
        input.pointer_moved(Vec2::new(20.0, 10.0));
        assert_eq!(input.pending().pointer_delta, Vec2::ZERO);

        input.button_down(MouseButton::Left);
        input.pointer_moved(Vec2::new(25.0, 12.0));
        input.pointer_moved(Vec2::new(30.0, 15.0));
        let snap = input.snapshot();
        assert_eq!(snap.pointer_delta, Vec2::new(10.0, 5.0));
        assert!(snap.button_held(MouseButton::Left));

        // deltas are zeroed by the snapshot, held buttons survive
        let next = input.snapshot();
        assert_eq!(next.pointer_delta, Vec2::ZERO);
        assert!(next.button_held(MouseButton::Left));
    }

    #[test]
    fn first_pointer_report_has_no_delta() {
        let mut input = InputState::new();
        input.button_down(MouseButton::Right);
        input.pointer_moved(Vec2::new(100.0, 100.0));
        assert_eq!(input.snapshot().pointer_delta, Vec2::ZERO);
    }

    #[test]
    fn tap_is_pressed_but_not_held() {
        let mut input = InputState::new();
        input.press(Key::Space);
        let snap = input.snapshot();
        assert!(snap.was_pressed(Key::Space));
        assert!(!snap.is_held(Key::Space));
        assert!(!snap.was_released(Key::Space));
    }

    #[test]
    fn with_pressed_builds_edge_snapshot() {
        let snap = InputSnapshot::with_pressed(&[Key::Down]);
        assert!(snap.was_pressed(Key::Down));
        assert!(!snap.was_pressed(Key::Up));
    }
}
