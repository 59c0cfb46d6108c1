//! Key bindings from raw winit key codes to player actions
//!
//! Defaults:
//! - W/S or Up/Down: forward/backward
//! - A/D or Left/Right: left/right
//! - Shift: sprint
//! - Space: jump
//! - C: toggle first/third person
//! - Escape: release the cursor
//!
//! Any action can be rebound from config strings such as `jump = "KeyJ"`.

use std::collections::HashMap;
use std::fmt;

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Semantic input actions the player session understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Sprint,
    Jump,
    /// Switch between first and third person
    ToggleCamera,
    /// Give the cursor back to the OS
    ReleaseCursor,
}

impl InputAction {
    pub const ALL: [InputAction; 8] = [
        InputAction::MoveForward,
        InputAction::MoveBackward,
        InputAction::MoveLeft,
        InputAction::MoveRight,
        InputAction::Sprint,
        InputAction::Jump,
        InputAction::ToggleCamera,
        InputAction::ReleaseCursor,
    ];

    /// Config name of the action
    pub fn name(self) -> &'static str {
        match self {
            InputAction::MoveForward => "move_forward",
            InputAction::MoveBackward => "move_backward",
            InputAction::MoveLeft => "move_left",
            InputAction::MoveRight => "move_right",
            InputAction::Sprint => "sprint",
            InputAction::Jump => "jump",
            InputAction::ToggleCamera => "toggle_camera",
            InputAction::ReleaseCursor => "release_cursor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    /// Actions that are held rather than triggered
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            InputAction::MoveForward
                | InputAction::MoveBackward
                | InputAction::MoveLeft
                | InputAction::MoveRight
                | InputAction::Sprint
        )
    }
}

/// Error type for binding overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// No action with this name
    UnknownAction(String),
    /// Key name could not be parsed
    UnknownKey(String),
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::UnknownAction(name) => write!(f, "Unknown input action: {}", name),
            BindingError::UnknownKey(name) => write!(f, "Unknown key name: {}", name),
        }
    }
}

impl std::error::Error for BindingError {}

/// Parse a key name into a winit key code
///
/// Accepts winit's own names (`KeyW`, `Digit1`, `ShiftLeft`, `ArrowUp`) and
/// a few short forms (`W`, `1`, `Shift`, `Up`). Matching is case-insensitive.
pub fn parse_key_code(name: &str) -> Option<KeyCode> {
    let upper = name.trim().to_ascii_uppercase();
    let short = upper
        .strip_prefix("KEY")
        .or_else(|| upper.strip_prefix("DIGIT"))
        .filter(|rest| rest.len() == 1)
        .unwrap_or(upper.as_str());

    let code = match short {
        "A" => KeyCode::KeyA,
        "B" => KeyCode::KeyB,
        "C" => KeyCode::KeyC,
        "D" => KeyCode::KeyD,
        "E" => KeyCode::KeyE,
        "F" => KeyCode::KeyF,
        "G" => KeyCode::KeyG,
        "H" => KeyCode::KeyH,
        "I" => KeyCode::KeyI,
        "J" => KeyCode::KeyJ,
        "K" => KeyCode::KeyK,
        "L" => KeyCode::KeyL,
        "M" => KeyCode::KeyM,
        "N" => KeyCode::KeyN,
        "O" => KeyCode::KeyO,
        "P" => KeyCode::KeyP,
        "Q" => KeyCode::KeyQ,
        "R" => KeyCode::KeyR,
        "S" => KeyCode::KeyS,
        "T" => KeyCode::KeyT,
        "U" => KeyCode::KeyU,
        "V" => KeyCode::KeyV,
        "W" => KeyCode::KeyW,
        "X" => KeyCode::KeyX,
        "Y" => KeyCode::KeyY,
        "Z" => KeyCode::KeyZ,
        "0" => KeyCode::Digit0,
        "1" => KeyCode::Digit1,
        "2" => KeyCode::Digit2,
        "3" => KeyCode::Digit3,
        "4" => KeyCode::Digit4,
        "5" => KeyCode::Digit5,
        "6" => KeyCode::Digit6,
        "7" => KeyCode::Digit7,
        "8" => KeyCode::Digit8,
        "9" => KeyCode::Digit9,
        "SPACE" => KeyCode::Space,
        "ESCAPE" | "ESC" => KeyCode::Escape,
        "ENTER" => KeyCode::Enter,
        "TAB" => KeyCode::Tab,
        "SHIFT" | "SHIFTLEFT" => KeyCode::ShiftLeft,
        "SHIFTRIGHT" => KeyCode::ShiftRight,
        "CONTROL" | "CTRL" | "CONTROLLEFT" => KeyCode::ControlLeft,
        "CONTROLRIGHT" => KeyCode::ControlRight,
        "ALT" | "ALTLEFT" => KeyCode::AltLeft,
        "ALTRIGHT" => KeyCode::AltRight,
        "UP" | "ARROWUP" => KeyCode::ArrowUp,
        "DOWN" | "ARROWDOWN" => KeyCode::ArrowDown,
        "LEFT" | "ARROWLEFT" => KeyCode::ArrowLeft,
        "RIGHT" | "ARROWRIGHT" => KeyCode::ArrowRight,
        _ => return None,
    };
    Some(code)
}

/// Maps key codes to actions
///
/// Several keys may trigger the same action; each key triggers at most one.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    map: HashMap<KeyCode, InputAction>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.add(KeyCode::KeyW, InputAction::MoveForward);
        bindings.add(KeyCode::ArrowUp, InputAction::MoveForward);
        bindings.add(KeyCode::KeyS, InputAction::MoveBackward);
        bindings.add(KeyCode::ArrowDown, InputAction::MoveBackward);
        bindings.add(KeyCode::KeyA, InputAction::MoveLeft);
        bindings.add(KeyCode::ArrowLeft, InputAction::MoveLeft);
        bindings.add(KeyCode::KeyD, InputAction::MoveRight);
        bindings.add(KeyCode::ArrowRight, InputAction::MoveRight);
        bindings.add(KeyCode::ShiftLeft, InputAction::Sprint);
        bindings.add(KeyCode::ShiftRight, InputAction::Sprint);
        bindings.add(KeyCode::Space, InputAction::Jump);
        bindings.add(KeyCode::KeyC, InputAction::ToggleCamera);
        bindings.add(KeyCode::Escape, InputAction::ReleaseCursor);
        bindings
    }
}

impl KeyBindings {
    /// Bindings with no keys mapped
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    /// Map an extra key to `action`
    pub fn add(&mut self, key: KeyCode, action: InputAction) {
        self.map.insert(key, action);
    }

    /// Replace every key bound to `action` with `key`
    pub fn rebind(&mut self, action: InputAction, key: KeyCode) {
        self.map.retain(|_, bound| *bound != action);
        self.map.insert(key, action);
    }

    /// Rebind using config names
    ///
    /// Nothing changes when either name is invalid.
    pub fn rebind_by_name(&mut self, action: &str, key: &str) -> Result<(), BindingError> {
        let action = InputAction::from_name(action)
            .ok_or_else(|| BindingError::UnknownAction(action.to_string()))?;
        let key = parse_key_code(key).ok_or_else(|| BindingError::UnknownKey(key.to_string()))?;
        self.rebind(action, key);
        Ok(())
    }

    /// Apply `action = key` overrides, keeping defaults for malformed entries
    ///
    /// Returns the number of overrides applied.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut applied = 0;
        for (action, key) in overrides {
            match self.rebind_by_name(action, key) {
                Ok(()) => applied += 1,
                Err(e) => log::warn!("Ignoring key binding {} = {:?}: {}", action, key, e),
            }
        }
        applied
    }

    /// Action bound to `key`, if any
    pub fn action_for(&self, key: KeyCode) -> Option<InputAction> {
        self.map.get(&key).copied()
    }

    /// Keys bound to `action`
    pub fn keys_for(&self, action: InputAction) -> Vec<KeyCode> {
        let mut keys: Vec<KeyCode> = self
            .map
            .iter()
            .filter(|(_, bound)| **bound == action)
            .map(|(key, _)| *key)
            .collect();
        keys.sort_by_key(|k| format!("{:?}", k));
        keys
    }

    /// Map a keyboard event to `(action, pressed)`
    ///
    /// Releases of triggered (non-continuous) actions are swallowed.
    pub fn map_keyboard(&self, key: KeyCode, state: ElementState) -> Option<(InputAction, bool)> {
        let action = self.action_for(key)?;
        let pressed = state == ElementState::Pressed;
        if !pressed && !action.is_continuous() {
            return None;
        }
        Some((action, pressed))
    }
}
