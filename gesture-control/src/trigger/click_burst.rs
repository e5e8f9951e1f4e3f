//! Click-burst toggle detection
//!
//! Counts presses of one button that each follow the previous press by
//! less than a threshold. Reaching the target count fires once and starts
//! over; a slow press restarts the count at 1, since that press is itself
//! the first of a possible new burst.

use super::types::{PointerButton, PointerEvent};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default gap allowed between presses of one burst
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(200);
/// Default presses per burst
pub const DEFAULT_TARGET: u32 = 3;

#[derive(Debug, Clone)]
pub struct ClickBurstDetector {
    button: PointerButton,
    threshold: Duration,
    target: u32,
    count: u32,
    last_press: Option<Instant>,
}

impl ClickBurstDetector {
    pub fn new(button: PointerButton, threshold: Duration, target: u32) -> Self {
        Self {
            button,
            threshold,
            target: target.max(1),
            count: 0,
            last_press: None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn button(&self) -> PointerButton {
        self.button
    }

    /// Feed one pointer event. Returns true when it completes a burst.
    /// Releases and other buttons are ignored.
    pub fn observe(&mut self, event: &PointerEvent) -> bool {
        if !event.pressed || event.button != self.button {
            return false;
        }
        self.register_press(event.timestamp)
    }

    /// Count a press at `at`. Returns true when it completes a burst.
    pub fn register_press(&mut self, at: Instant) -> bool {
        let in_burst = self
            .last_press
            .is_some_and(|last| at.saturating_duration_since(last) < self.threshold);
        self.count = if in_burst { self.count + 1 } else { 1 };
        self.last_press = Some(at);
        debug!("{} click {}/{}", self.button, self.count, self.target);

        if self.count >= self.target {
            self.reset();
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_press = None;
    }
}

impl Default for ClickBurstDetector {
    fn default() -> Self {
        Self::new(PointerButton::Middle, DEFAULT_THRESHOLD, DEFAULT_TARGET)
    }
}
