//! OS input injection through `enigo`
//!
//! Requires the same permissions as any synthetic-input tool: Accessibility
//! on macOS, an X11/libei session on Linux.

use super::action::Key;
use super::sink::{ActionSink, ScrollDirection};
use enigo::{Axis, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use tracing::{debug, info};

/// Injects actions as real keyboard/mouse input
pub struct EnigoSink {
    enigo: Enigo,
    screen: Option<(i32, i32)>,
}

impl EnigoSink {
    /// Connect to the platform input backend.
    ///
    /// # Errors
    /// Returns `Error::Injection` if the backend cannot be opened (missing
    /// permissions, no display server).
    pub fn new() -> crate::Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| crate::Error::Injection(format!("failed to open input backend: {}", e)))?;
        let screen = enigo.main_display().ok();
        info!("Input backend ready (main display {:?})", screen);
        Ok(Self { enigo, screen })
    }

    fn key(&mut self, key: Key, direction: Direction) -> crate::Result<()> {
        self.enigo
            .key(to_enigo_key(key), direction)
            .map_err(|e| crate::Error::Injection(format!("key {}: {}", key.as_str(), e)))
    }
}

fn to_enigo_key(key: Key) -> enigo::Key {
    match key {
        Key::Control => enigo::Key::Control,
        Key::Shift => enigo::Key::Shift,
        Key::Alt => enigo::Key::Alt,
        Key::Meta => enigo::Key::Meta,
        Key::Tab => enigo::Key::Tab,
        Key::VolumeUp => enigo::Key::VolumeUp,
        Key::VolumeDown => enigo::Key::VolumeDown,
        Key::VolumeMute => enigo::Key::VolumeMute,
    }
}

impl ActionSink for EnigoSink {
    fn press_key(&mut self, key: Key) -> crate::Result<()> {
        self.key(key, Direction::Click)
    }

    fn scroll_by(&mut self, amount: u32, direction: ScrollDirection) -> crate::Result<()> {
        // enigo scrolls down for positive lengths, the opposite of the wheel sign.
        let length = -(amount as i32) * direction.sign();
        self.enigo
            .scroll(length, Axis::Vertical)
            .map_err(|e| crate::Error::Injection(format!("scroll: {}", e)))
    }

    fn send_hotkey(&mut self, combo: &[Key]) -> crate::Result<()> {
        let Some((last, modifiers)) = combo.split_last() else {
            return Ok(());
        };

        let mut pressed = Vec::with_capacity(modifiers.len());
        let mut result = Ok(());
        for &modifier in modifiers {
            if let Err(e) = self.key(modifier, Direction::Press) {
                result = Err(e);
                break;
            }
            pressed.push(modifier);
        }
        if result.is_ok() {
            result = self.key(*last, Direction::Click);
        }

        // Release whatever went down, even if a later key failed.
        for &modifier in pressed.iter().rev() {
            if let Err(e) = self.key(modifier, Direction::Release) {
                debug!("Failed to release {}: {}", modifier.as_str(), e);
            }
        }
        result
    }

    fn move_cursor_to(&mut self, x: i32, y: i32) -> crate::Result<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| crate::Error::Injection(format!("move cursor: {}", e)))
    }

    fn screen_size(&self) -> Option<(i32, i32)> {
        self.screen
    }
}
