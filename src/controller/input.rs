/// Platform-agnostic input handling
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseButton { button: MouseButton, is_down: bool },
    MouseWheel { delta_y: f32 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Other,
        }
    }

    /// Buttons that ask the host to engage pointer capture
    pub fn engages_capture(self) -> bool {
        matches!(self, MouseButton::Left | MouseButton::Middle)
    }
}

/// Request for the host to change pointer capture. The host performs the
/// actual grab and reports back with [`InputEvent::PointerLockChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRequest {
    Engage,
    Release,
}

/// Input accumulated between frames.
///
/// Event handlers write into this; the frame loop reads held keys and takes
/// the pending look/wheel deltas once per frame. Delta writes keep the most
/// recent value, so a burst of events before a frame collapses to the last one.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pub look_delta: (f32, f32),
    pub wheel_delta: f32,
    pub pointer_locked: bool,
    capture_request: Option<CaptureRequest>,
    release_key: Option<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input state that turns a press of `key` into a capture release request
    pub fn with_release_key(key: impl Into<String>) -> Self {
        Self {
            release_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                if self.pointer_locked && self.release_key.as_deref() == Some(key.as_str()) {
                    self.capture_request = Some(CaptureRequest::Release);
                }
                self.pressed_keys.insert(key.clone());
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(key.as_str());
            }
            InputEvent::MouseMove { dx, dy } => {
                if self.pointer_locked {
                    self.look_delta = (*dx, *dy);
                }
            }
            InputEvent::MouseButton { button, is_down } => {
                if *is_down && !self.pointer_locked && button.engages_capture() {
                    self.capture_request = Some(CaptureRequest::Engage);
                }
            }
            InputEvent::MouseWheel { delta_y } => {
                self.wheel_delta = *delta_y;
            }
            InputEvent::FocusLost => {
                self.clear_keys();
            }
            InputEvent::VisibilityChanged { visible } => {
                if !visible {
                    self.clear_keys();
                }
            }
            InputEvent::PointerLockChanged { locked } => {
                if self.pointer_locked != *locked {
                    debug!(locked = *locked, "pointer capture changed");
                }
                self.pointer_locked = *locked;
                if !*locked {
                    self.look_delta = (0.0, 0.0);
                }
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn consume_look(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.look_delta)
    }

    pub fn consume_wheel(&mut self) -> f32 {
        std::mem::take(&mut self.wheel_delta)
    }

    pub fn take_capture_request(&mut self) -> Option<CaptureRequest> {
        self.capture_request.take()
    }
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub jump: String,
    pub release_pointer: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            jump: " ".to_string(),
            release_pointer: "Escape".to_string(),
        }
    }
}

/// High-level queries over [`InputState`] through a set of bindings
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Single-character bindings match either case so Shift or Caps Lock
    /// don't drop movement keys.
    fn held(input: &InputState, binding: &str) -> bool {
        if input.is_key_pressed(binding) {
            return true;
        }
        let mut chars = binding.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                let swapped = if c.is_ascii_lowercase() {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                };
                input.is_key_pressed(swapped.encode_utf8(&mut [0; 4]))
            }
            _ => false,
        }
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        Self::held(input, &self.bindings.forward) || input.is_key_pressed("ArrowUp")
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        Self::held(input, &self.bindings.backward) || input.is_key_pressed("ArrowDown")
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        Self::held(input, &self.bindings.left) || input.is_key_pressed("ArrowLeft")
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        Self::held(input, &self.bindings.right) || input.is_key_pressed("ArrowRight")
    }

    pub fn is_jumping(&self, input: &InputState) -> bool {
        Self::held(input, &self.bindings.jump)
    }
}

/// winit → [`InputEvent`] conversions for the native host
#[cfg(not(target_arch = "wasm32"))]
pub mod native {
    use super::*;
    use winit::event::{ElementState, MouseScrollDelta};
    use winit::keyboard::{Key, NamedKey};

    /// Approximate pixels per wheel line, so line deltas scale like browser pixel deltas.
    const PIXELS_PER_LINE: f32 = 100.0;

    /// Normalize a winit logical key to the browser `KeyboardEvent.key` names
    /// the bindings use.
    pub fn key_name(key: &Key) -> Option<String> {
        match key {
            Key::Character(s) => Some(s.to_string()),
            Key::Named(NamedKey::Space) => Some(" ".to_string()),
            Key::Named(NamedKey::Escape) => Some("Escape".to_string()),
            Key::Named(NamedKey::ArrowUp) => Some("ArrowUp".to_string()),
            Key::Named(NamedKey::ArrowDown) => Some("ArrowDown".to_string()),
            Key::Named(NamedKey::ArrowLeft) => Some("ArrowLeft".to_string()),
            Key::Named(NamedKey::ArrowRight) => Some("ArrowRight".to_string()),
            Key::Named(NamedKey::Shift) => Some("Shift".to_string()),
            Key::Named(NamedKey::Control) => Some("Control".to_string()),
            _ => None,
        }
    }

    pub fn keyboard_to_input(key: &Key, state: ElementState) -> Option<InputEvent> {
        let name = key_name(key)?;
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown(name),
            ElementState::Released => InputEvent::KeyUp(name),
        })
    }

    pub fn mouse_button_to_input(button: winit::event::MouseButton, state: ElementState) -> InputEvent {
        let button = match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        };
        InputEvent::MouseButton { button, is_down: state == ElementState::Pressed }
    }

    /// winit reports wheel-up as positive; browsers report it as negative.
    pub fn mouse_wheel_to_input(delta: MouseScrollDelta) -> InputEvent {
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y * PIXELS_PER_LINE,
            MouseScrollDelta::PixelDelta(p) => -p.y as f32,
        };
        InputEvent::MouseWheel { delta_y }
    }

    pub fn mouse_motion_to_input(delta: (f64, f64)) -> InputEvent {
        InputEvent::MouseMove { dx: delta.0 as f32, dy: delta.1 as f32 }
    }
}

/// web-sys → [`InputEvent`] conversions for the browser host
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent, WheelEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::MouseMove {
            dx: e.movement_x() as f32,
            dy: e.movement_y() as f32,
        }
    }

    pub fn mouse_button_to_input(e: &MouseEvent, is_down: bool) -> InputEvent {
        InputEvent::MouseButton {
            button: MouseButton::from_web_button(e.button()),
            is_down,
        }
    }

    pub fn mouse_wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::MouseWheel { delta_y: e.delta_y() as f32 }
    }
}
