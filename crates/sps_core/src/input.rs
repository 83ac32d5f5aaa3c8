//! Polled input state with level-triggered and consume-on-poll edge queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true every tick the key
//!   is physically down. Used for continuous actions like movement.
//!
//! - **Edge-triggered (pressed edge):** `is_pressed_edge(key)` returns true on
//!   the first poll after the key goes down and marks the press consumed. It
//!   stays false for the rest of that hold, however many times it is polled,
//!   until a key-up clears the consumed flag. A press is therefore never lost
//!   on a tick that happens not to poll it, and never fires twice.
//!
//! Pointer state is plain data: the last cursor position, whether the primary
//! button is down, and where it went down.

use std::collections::HashSet;

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    A,
    D,
    Space,
    Shift,
    Tab,
    Enter,
    F,
    R,
    F1,
    F3,
    F4,
    Escape,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub position: Vec2,
    pub is_down: bool,
    pub down_origin: Vec2,
}

pub struct InputState {
    held: HashSet<Key>,
    consumed: HashSet<Key>,
    pub pointer: PointerState,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            consumed: HashSet::new(),
            pointer: PointerState::default(),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
        self.consumed.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// True exactly once per continuous hold of `key`.
    pub fn is_pressed_edge(&mut self, key: Key) -> bool {
        if self.held.contains(&key) && !self.consumed.contains(&key) {
            self.consumed.insert(key);
            return true;
        }
        false
    }

    /// Polls several keys and reports whether any of them produced an edge.
    ///
    /// Every key is polled, so a simultaneous press of two bound keys is
    /// consumed for both instead of leaving one pending for the next tick.
    pub fn any_pressed_edge(&mut self, keys: &[Key]) -> bool {
        let mut fired = false;
        for &key in keys {
            fired |= self.is_pressed_edge(key);
        }
        fired
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        self.pointer.position = position;
    }

    pub fn pointer_down(&mut self, position: Vec2) {
        self.pointer.position = position;
        self.pointer.is_down = true;
        self.pointer.down_origin = position;
    }

    pub fn pointer_up(&mut self) {
        self.pointer.is_down = false;
    }

    /// Drops every held key, e.g. when the window loses focus and key-up
    /// events will never arrive.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.consumed.clear();
        self.pointer.is_down = false;
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
