#[cfg(target_arch = "wasm32")]
pub mod wasm;

use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;

/// Keys the orbit controls react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Left,
    Right,
    Up,
    Down,
}

impl KeyCode {
    /// Parses both DOM `KeyboardEvent.key` names and short names.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowLeft" | "Left" => Self::Left,
            "ArrowRight" | "Right" => Self::Right,
            "ArrowUp" | "Up" => Self::Up,
            "ArrowDown" | "Down" => Self::Down,
            _ => return None,
        };
        Some(key)
    }
}

/// Identifier for a mouse button, numbered like DOM `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const RIGHT: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Input snapshot written by event handlers and read once per frame.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    mouse_buttons: RwLock<HashSet<MouseButton>>,
    mouse_position: RwLock<Vec2>,
    wheel: RwLock<f32>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn set_mouse_button_down(&self, button: MouseButton) {
        self.mouse_buttons.write().insert(button);
    }

    pub fn set_mouse_button_up(&self, button: MouseButton) {
        self.mouse_buttons.write().remove(&button);
    }

    pub fn set_mouse_position(&self, position: Vec2) {
        *self.mouse_position.write() = position;
    }

    /// Accumulates wheel motion; positive values scroll toward the user (zoom out).
    pub fn add_wheel_delta(&self, delta: f32) {
        *self.wheel.write() += delta;
    }

    /// Returns the wheel motion accumulated since the previous call.
    pub fn take_wheel_delta(&self) -> f32 {
        std::mem::take(&mut *self.wheel.write())
    }

    /// Forgets held keys and buttons, e.g. when the surface loses focus.
    pub fn release_all(&self) {
        self.keys.write().clear();
        self.mouse_buttons.write().clear();
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.read().contains(&button)
    }

    pub fn any_mouse_button_down(&self) -> bool {
        !self.mouse_buttons.read().is_empty()
    }

    pub fn mouse_position(&self) -> Vec2 {
        *self.mouse_position.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dom_and_short_key_names() {
        assert_eq!(KeyCode::from_name("ArrowLeft"), Some(KeyCode::Left));
        assert_eq!(KeyCode::from_name("Down"), Some(KeyCode::Down));
        assert_eq!(KeyCode::from_name("a"), None);
    }

    #[test]
    fn input_state_tracks_keys_and_buttons() {
        let state = InputState::new();
        state.set_key_down(KeyCode::Up);
        state.set_mouse_button_down(MouseButton::RIGHT);
        assert!(state.is_key_down(KeyCode::Up));
        assert!(state.is_mouse_button_down(MouseButton::RIGHT));
        assert!(state.any_mouse_button_down());
        state.release_all();
        assert!(!state.is_key_down(KeyCode::Up));
        assert!(!state.any_mouse_button_down());
    }

    #[test]
    fn wheel_delta_is_drained() {
        let state = InputState::new();
        state.add_wheel_delta(1.5);
        state.add_wheel_delta(-0.5);
        assert_eq!(state.take_wheel_delta(), 1.0);
        assert_eq!(state.take_wheel_delta(), 0.0);
    }
}
