//! Last-fire debounce
//!
//! A physical pose persists across many camera frames. A cooldown lets the
//! first frame fire and swallows repeats until the window has elapsed.

use std::time::{Duration, Instant};

/// Minimum interval between two firings of the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    window: Duration,
    last_fired: Option<Instant>,
}

impl Cooldown {
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether firing at `now` would be allowed.
    ///
    /// A clock that went backwards (`now` before the last firing) counts as
    /// zero elapsed time.
    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.window,
        }
    }

    /// Fire if ready; returns whether it fired.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.last_fired = Some(now);
            true
        } else {
            false
        }
    }

    /// Time left before the next firing is allowed
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_fired {
            None => Duration::ZERO,
            Some(last) => self
                .window
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}
