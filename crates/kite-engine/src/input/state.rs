//! Held-key state derived from queued input events.
//!
//! States never see raw events; they query this read-only snapshot.

use std::collections::HashSet;

use super::queue::InputEvent;

/// Browser-style key codes for the common platformer bindings.
pub mod keys {
    pub const SPACE: u32 = 32;
    pub const LEFT: u32 = 37;
    pub const UP: u32 = 38;
    pub const RIGHT: u32 = 39;
    pub const DOWN: u32 = 40;
    pub const X: u32 = 88;
    pub const Z: u32 = 90;
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<u32>,
    pressed: HashSet<u32>,
    released: HashSet<u32>,
    custom: Vec<InputEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget edge-triggered state from the previous step. Held keys persist.
    pub fn begin_step(&mut self) {
        self.pressed.clear();
        self.released.clear();
        self.custom.clear();
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown { key_code } => {
                // Key repeat does not count as a fresh press.
                if self.held.insert(key_code) {
                    self.pressed.insert(key_code);
                }
            }
            InputEvent::KeyUp { key_code } => {
                if self.held.remove(&key_code) {
                    self.released.insert(key_code);
                }
            }
            InputEvent::Custom { .. } => self.custom.push(*event),
        }
    }

    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a InputEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn is_down(&self, key_code: u32) -> bool {
        self.held.contains(&key_code)
    }

    /// Pressed during this step.
    pub fn just_pressed(&self, key_code: u32) -> bool {
        self.pressed.contains(&key_code)
    }

    pub fn just_released(&self, key_code: u32) -> bool {
        self.released.contains(&key_code)
    }

    /// -1, 0 or 1 from a pair of opposing keys.
    pub fn axis(&self, negative: u32, positive: u32) -> f32 {
        let mut value = 0.0;
        if self.is_down(negative) {
            value -= 1.0;
        }
        if self.is_down(positive) {
            value += 1.0;
        }
        value
    }

    pub fn custom_events(&self) -> &[InputEvent] {
        &self.custom
    }

    /// Release everything (e.g. when the host window loses focus).
    pub fn reset(&mut self) {
        self.held.clear();
        self.begin_step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_hold_release() {
        let mut input = InputState::new();
        input.apply(&InputEvent::KeyDown { key_code: keys::RIGHT });
        assert!(input.is_down(keys::RIGHT));
        assert!(input.just_pressed(keys::RIGHT));

        input.begin_step();
        assert!(input.is_down(keys::RIGHT));
        assert!(!input.just_pressed(keys::RIGHT));

        input.apply(&InputEvent::KeyUp { key_code: keys::RIGHT });
        assert!(!input.is_down(keys::RIGHT));
        assert!(input.just_released(keys::RIGHT));
    }

    #[test]
    fn key_repeat_is_not_a_new_press() {
        let mut input = InputState::new();
        input.apply(&InputEvent::KeyDown { key_code: keys::X });
        input.begin_step();
        input.apply(&InputEvent::KeyDown { key_code: keys::X });
        assert!(!input.just_pressed(keys::X));
    }

    #[test]
    fn axis_cancels_opposites() {
        let mut input = InputState::new();
        input.apply_all(&[
            InputEvent::KeyDown { key_code: keys::LEFT },
            InputEvent::KeyDown { key_code: keys::RIGHT },
        ]);
        assert_eq!(input.axis(keys::LEFT, keys::RIGHT), 0.0);
        input.apply(&InputEvent::KeyUp { key_code: keys::RIGHT });
        assert_eq!(input.axis(keys::LEFT, keys::RIGHT), -1.0);
    }

    #[test]
    fn custom_events_last_one_step() {
        let mut input = InputState::new();
        input.apply(&InputEvent::Custom { kind: 1, a: 0.0, b: 0.0, c: 0.0 });
        assert_eq!(input.custom_events().len(), 1);
        input.begin_step();
        assert!(input.custom_events().is_empty());
    }
}
