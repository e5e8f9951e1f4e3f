//! Mouse / Gesture mode switching

pub mod controller;

pub use controller::ModeController;

use crate::trigger::click_burst::{DEFAULT_TARGET, DEFAULT_THRESHOLD};
use crate::trigger::types::PointerButton;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Whether gesture control is intercepting input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Physical mouse only; the gesture loop is not running
    #[default]
    Mouse,
    /// The gesture loop is running
    Gesture,
}

impl Mode {
    pub fn toggled(&self) -> Mode {
        match self {
            Mode::Mouse => Mode::Gesture,
            Mode::Gesture => Mode::Mouse,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Mouse => f.write_str("mouse"),
            Mode::Gesture => f.write_str("gesture"),
        }
    }
}

/// `[mode]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Mode at startup
    pub start_mode: Mode,
    /// Button whose bursts toggle the mode
    pub trigger_button: PointerButton,
    /// Maximum gap between presses of one burst
    pub click_threshold_ms: u64,
    /// Presses per burst
    pub click_count: u32,
    /// How long entering Gesture mode waits for the loop to open its inputs
    pub init_timeout_ms: u64,
    /// How long leaving Gesture mode waits for the loop to release them
    pub stop_timeout_ms: u64,
    /// Trigger drain interval
    pub poll_interval_ms: u64,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            start_mode: Mode::Mouse,
            trigger_button: PointerButton::Middle,
            click_threshold_ms: DEFAULT_THRESHOLD.as_millis() as u64,
            click_count: DEFAULT_TARGET,
            init_timeout_ms: 5000,
            stop_timeout_ms: 3000,
            poll_interval_ms: 10,
        }
    }
}

impl ModeConfig {
    pub fn click_threshold(&self) -> Duration {
        Duration::from_millis(self.click_threshold_ms)
    }

    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.click_threshold_ms == 0 || self.click_threshold_ms > 2000 {
            return Err(crate::Error::Config(format!(
                "click_threshold_ms must be in (0, 2000], got {}",
                self.click_threshold_ms
            )));
        }
        if !(2..=10).contains(&self.click_count) {
            return Err(crate::Error::Config(format!(
                "click_count must be in [2, 10], got {}",
                self.click_count
            )));
        }
        if self.init_timeout_ms == 0 || self.stop_timeout_ms == 0 {
            return Err(crate::Error::Config("init/stop timeouts must be > 0".to_string()));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > 1000 {
            return Err(crate::Error::Config(format!(
                "poll_interval_ms must be in (0, 1000], got {}",
                self.poll_interval_ms
            )));
        }
        Ok(())
    }
}
