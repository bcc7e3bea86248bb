//! Decoded terminal input events.
//!
//! Keys reuse crossterm's `KeyCode`/`KeyModifiers` vocabulary; pointer events
//! carry zero-based preview cell coordinates.

use crossterm::event::{KeyCode, KeyModifiers};
use std::fmt;

/// A physical mouse button as reported by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Button number used by the desktop injection tool.
    pub fn number(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
        }
    }
}

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// A button is down. With `motion` set this is a drag sample.
    Press(MouseButton),
    /// Some button was released. The wire format does not say which.
    Release,
    WheelUp,
    WheelDown,
    /// Motion with no button held.
    Move,
}

/// A single pointer report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerInput {
    /// Zero-based column.
    pub x: u16,
    /// Zero-based row.
    pub y: u16,
    pub action: PointerAction,
    /// Set when the report was generated by pointer movement.
    pub motion: bool,
    pub modifiers: KeyModifiers,
}

impl PointerInput {
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(KeyModifiers::CONTROL)
    }
}

/// One decoded input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key {
        code: KeyCode,
        modifiers: KeyModifiers,
    },
    Pointer(PointerInput),
    /// Well-formed input that carries no meaning for us (focus reports,
    /// unknown function keys).
    None,
    /// Malformed input; the byte stream can no longer be trusted.
    Error(String),
}

impl InputEvent {
    pub fn key(code: KeyCode) -> Self {
        InputEvent::Key {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn key_with(code: KeyCode, modifiers: KeyModifiers) -> Self {
        InputEvent::Key { code, modifiers }
    }
}

fn mod_str(m: KeyModifiers) -> String {
    let mut out = Vec::new();
    if m.contains(KeyModifiers::ALT) {
        out.push("Alt");
    }
    if m.contains(KeyModifiers::CONTROL) {
        out.push("Ctrl");
    }
    if m.contains(KeyModifiers::SHIFT) {
        out.push("Shift");
    }
    out.join(" ")
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputEvent::Key { code, modifiers } => {
                write!(f, "EventKey: k: {:?}, mod: {}", code, mod_str(*modifiers))
            }
            InputEvent::Pointer(p) => write!(
                f,
                "EventMouse: x: {}, y: {}, b: {:?}, motion: {}, mod: {}",
                p.x,
                p.y,
                p.action,
                p.motion,
                mod_str(p.modifiers)
            ),
            InputEvent::None => write!(f, "EventNone"),
            InputEvent::Error(msg) => write!(f, "EventError: {}", msg),
        }
    }
}
