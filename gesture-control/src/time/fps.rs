//! Frame-rate measurement for the gesture loop

use std::time::{Duration, Instant};

/// Counts frames and reports the rate once per reporting interval.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    interval: Duration,
    window_start: Option<Instant>,
    frames_in_window: u32,
    last_fps: f64,
    total_frames: u64,
}

impl FpsMeter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_start: None,
            frames_in_window: 0,
            last_fps: 0.0,
            total_frames: 0,
        }
    }

    /// Record one frame. Returns the measured rate when a reporting window
    /// closes.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.total_frames += 1;
        let start = *self.window_start.get_or_insert(now);
        self.frames_in_window += 1;

        let elapsed = now.saturating_duration_since(start);
        if elapsed >= self.interval && !elapsed.is_zero() {
            self.last_fps = self.frames_in_window as f64 / elapsed.as_secs_f64();
            self.window_start = Some(now);
            self.frames_in_window = 0;
            Some(self.last_fps)
        } else {
            None
        }
    }

    /// Rate measured over the last closed window
    pub fn fps(&self) -> f64 {
        self.last_fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
