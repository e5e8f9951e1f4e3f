//! Action Sink contract
//!
//! Each call is fire-and-forget from the gesture loop's point of view: a
//! failure is logged and the loop moves on to the next frame.

use super::action::Key;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Vertical scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    /// +1 for up, -1 for down (wheel convention)
    pub fn sign(&self) -> i32 {
        match self {
            ScrollDirection::Up => 1,
            ScrollDirection::Down => -1,
        }
    }
}

/// OS input-injection primitives
pub trait ActionSink {
    fn press_key(&mut self, key: Key) -> crate::Result<()>;

    fn scroll_by(&mut self, amount: u32, direction: ScrollDirection) -> crate::Result<()>;

    /// Press every key of the combo in order, then release in reverse.
    fn send_hotkey(&mut self, combo: &[Key]) -> crate::Result<()>;

    fn move_cursor_to(&mut self, x: i32, y: i32) -> crate::Result<()>;

    /// Size of the main display, when the sink can tell
    fn screen_size(&self) -> Option<(i32, i32)> {
        None
    }
}

impl<S: ActionSink + ?Sized> ActionSink for Box<S> {
    fn press_key(&mut self, key: Key) -> crate::Result<()> {
        (**self).press_key(key)
    }

    fn scroll_by(&mut self, amount: u32, direction: ScrollDirection) -> crate::Result<()> {
        (**self).scroll_by(amount, direction)
    }

    fn send_hotkey(&mut self, combo: &[Key]) -> crate::Result<()> {
        (**self).send_hotkey(combo)
    }

    fn move_cursor_to(&mut self, x: i32, y: i32) -> crate::Result<()> {
        (**self).move_cursor_to(x, y)
    }

    fn screen_size(&self) -> Option<(i32, i32)> {
        (**self).screen_size()
    }
}

/// Dry-run sink: logs what would have been injected
#[derive(Debug, Default, Clone)]
pub struct LogSink {
    screen: Option<(i32, i32)>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_screen(width: i32, height: i32) -> Self {
        Self {
            screen: Some((width, height)),
        }
    }
}

impl ActionSink for LogSink {
    fn press_key(&mut self, key: Key) -> crate::Result<()> {
        info!("[dry-run] press {}", key.as_str());
        Ok(())
    }

    fn scroll_by(&mut self, amount: u32, direction: ScrollDirection) -> crate::Result<()> {
        info!("[dry-run] scroll {}", amount as i64 * direction.sign() as i64);
        Ok(())
    }

    fn send_hotkey(&mut self, combo: &[Key]) -> crate::Result<()> {
        let names: Vec<_> = combo.iter().map(Key::as_str).collect();
        info!("[dry-run] hotkey {}", names.join("+"));
        Ok(())
    }

    fn move_cursor_to(&mut self, x: i32, y: i32) -> crate::Result<()> {
        tracing::debug!("[dry-run] cursor -> ({}, {})", x, y);
        Ok(())
    }

    fn screen_size(&self) -> Option<(i32, i32)> {
        self.screen
    }
}

/// A call received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkCall {
    Key(Key),
    Scroll { amount: u32, direction: ScrollDirection },
    Hotkey(Vec<Key>),
    MoveCursor { x: i32, y: i32 },
}

/// Collects calls instead of injecting them.
///
/// Clones share the same call log, so a test can keep one handle while the
/// gesture loop owns the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn push(&self, call: SinkCall) {
        self.calls.lock().push(call);
    }
}

impl ActionSink for RecordingSink {
    fn press_key(&mut self, key: Key) -> crate::Result<()> {
        self.push(SinkCall::Key(key));
        Ok(())
    }

    fn scroll_by(&mut self, amount: u32, direction: ScrollDirection) -> crate::Result<()> {
        self.push(SinkCall::Scroll { amount, direction });
        Ok(())
    }

    fn send_hotkey(&mut self, combo: &[Key]) -> crate::Result<()> {
        self.push(SinkCall::Hotkey(combo.to_vec()));
        Ok(())
    }

    fn move_cursor_to(&mut self, x: i32, y: i32) -> crate::Result<()> {
        self.push(SinkCall::MoveCursor { x, y });
        Ok(())
    }
}
