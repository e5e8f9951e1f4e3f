//! Trigger event types

use crate::mode::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Remote message that forces Gesture mode
pub const GESTURE_MODE_ON: &str = "Gesture Mode ON";
/// Remote message that forces Mouse mode
pub const GESTURE_MODE_OFF: &str = "Gesture Mode OFF";

/// Physical pointer button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Left,
    Right,
    Middle,
    /// Extra buttons by platform code
    Other(u8),
}

impl fmt::Display for PointerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerButton::Left => f.write_str("left"),
            PointerButton::Right => f.write_str("right"),
            PointerButton::Middle => f.write_str("middle"),
            PointerButton::Other(code) => write!(f, "button {}", code),
        }
    }
}

/// One press or release from the pointer listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub button: PointerButton,
    pub pressed: bool,
    pub timestamp: Instant,
}

impl PointerEvent {
    pub fn press(button: PointerButton, timestamp: Instant) -> Self {
        Self {
            button,
            pressed: true,
            timestamp,
        }
    }

    pub fn release(button: PointerButton, timestamp: Instant) -> Self {
        Self {
            button,
            pressed: false,
            timestamp,
        }
    }
}

/// What a trigger asks the mode controller to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCommand {
    /// Flip between Mouse and Gesture (click burst)
    Toggle,
    /// Force a mode (remote notification)
    Set(Mode),
}

impl ModeCommand {
    /// Parse a remote notification. Surrounding whitespace and line endings
    /// are ignored; anything else must match exactly.
    pub fn from_remote(message: &str) -> Option<Self> {
        match message.trim() {
            GESTURE_MODE_ON => Some(ModeCommand::Set(Mode::Gesture)),
            GESTURE_MODE_OFF => Some(ModeCommand::Set(Mode::Mouse)),
            _ => None,
        }
    }
}

impl fmt::Display for ModeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeCommand::Toggle => f.write_str("toggle"),
            ModeCommand::Set(mode) => write!(f, "set {}", mode),
        }
    }
}
