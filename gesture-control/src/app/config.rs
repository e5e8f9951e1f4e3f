//! Configuration Management

use crate::gesture::cursor::CursorConfig;
use crate::gesture::rules::{GestureConfig, GestureRule};
use crate::gesture::worker::SessionConfig;
use crate::mode::ModeConfig;
use crate::output::action::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Trigger queues and frame reading
    pub capture: CaptureConfig,
    /// Gesture profile / rule table
    pub gesture: GestureConfig,
    /// How actions become key presses and scrolls
    pub actions: DispatchConfig,
    /// Air-mouse mapping
    pub cursor: CursorConfig,
    /// Mode switching
    pub mode: ModeConfig,
    /// Remote notification transport
    pub remote: RemoteConfig,
}

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capacity of each trigger ring (power of 2)
    pub trigger_buffer_size: usize,
    /// Pause after a failed frame read (ms)
    pub frame_retry_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            trigger_buffer_size: 256,
            frame_retry_ms: 100,
        }
    }
}

/// Remote trigger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Listen for remote "Gesture Mode ON/OFF" messages
    pub enabled: bool,
    /// Notification bridge address (host:port)
    pub address: String,
    /// Delay before reconnecting (ms)
    pub retry_delay_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:7878".to_string(),
            retry_delay_ms: 5000,
        }
    }
}

impl RemoteConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let size = self.capture.trigger_buffer_size;
        if !size.is_power_of_two() {
            return Err(crate::Error::Config(format!(
                "trigger_buffer_size must be a power of 2, got {}",
                size
            )));
        }
        if self.capture.frame_retry_ms > 10_000 {
            return Err(crate::Error::Config(format!(
                "frame_retry_ms must be <= 10000, got {}",
                self.capture.frame_retry_ms
            )));
        }
        self.gesture.validate()?;
        if !(1..=100).contains(&self.actions.scroll_amount) {
            return Err(crate::Error::Config(format!(
                "scroll_amount must be in [1, 100], got {}",
                self.actions.scroll_amount
            )));
        }
        if !(1..=20).contains(&self.actions.volume_steps) {
            return Err(crate::Error::Config(format!(
                "volume_steps must be in [1, 20], got {}",
                self.actions.volume_steps
            )));
        }
        if self.actions.next_tab.is_empty() || self.actions.previous_tab.is_empty() {
            return Err(crate::Error::Config("tab hotkeys must not be empty".to_string()));
        }
        self.cursor.validate()?;
        self.mode.validate()?;
        if self.remote.address.trim().is_empty() || !self.remote.address.contains(':') {
            return Err(crate::Error::Config(format!(
                "remote address must be host:port, got '{}'",
                self.remote.address
            )));
        }
        if self.remote.retry_delay_ms == 0 {
            return Err(crate::Error::Config("retry_delay_ms must be > 0".to_string()));
        }
        Ok(())
    }

    /// Rule table the gesture machine runs
    pub fn rules(&self) -> Vec<GestureRule> {
        self.gesture.effective_rules(self.cursor.enabled)
    }

    /// Settings for a gesture session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            rules: self.rules(),
            cursor: self.cursor.clone(),
            dispatch: self.actions.clone(),
            frame_retry: Duration::from_millis(self.capture.frame_retry_ms),
            init_timeout: self.mode.init_timeout(),
        }
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".gesture_control").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Look up a dotted key such as `mode.click_count`.
    pub fn get_value(&self, key: &str) -> Result<String, crate::Error> {
        let root = toml::Value::try_from(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        let mut current = &root;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| crate::Error::Config(format!("unknown config key '{}'", key)))?;
        }
        Ok(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Return a copy with the dotted `key` set to `value`.
    ///
    /// `value` is read as a TOML literal (`3`, `true`, `["ctrl", "tab"]`);
    /// anything that does not parse as one is taken as a string. The result
    /// is validated.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self, crate::Error> {
        let mut root = toml::Value::try_from(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        let parts: Vec<&str> = key.split('.').collect();
        let Some((leaf, parents)) = parts.split_last() else {
            return Err(crate::Error::Config("empty config key".to_string()));
        };

        let mut table = &mut root;
        for part in parents {
            table = table
                .get_mut(*part)
                .filter(|v| v.is_table())
                .ok_or_else(|| crate::Error::Config(format!("unknown config key '{}'", key)))?;
        }
        let table = table
            .as_table_mut()
            .ok_or_else(|| crate::Error::Config(format!("unknown config key '{}'", key)))?;
        if !table.contains_key(*leaf) {
            return Err(crate::Error::Config(format!("unknown config key '{}'", key)));
        }
        table.insert(leaf.to_string(), parse_literal(value));

        let config: Self = root.try_into().map_err(|e: toml::de::Error| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_literal(value: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {}", value))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()))
}
