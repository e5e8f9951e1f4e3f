//! Actions and their dispatch onto an [`ActionSink`]

use super::sink::{ActionSink, ScrollDirection};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// One control action, produced and consumed within a single frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ScrollUp,
    ScrollDown,
    VolumeUp,
    VolumeDown,
    NextTab,
    PreviousTab,
    /// Absolute screen position for the pointer
    MoveCursor { x: i32, y: i32 },
    /// Nothing to do this frame
    None,
}

impl Action {
    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Short name for logs and replay output
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ScrollUp => "scroll_up",
            Action::ScrollDown => "scroll_down",
            Action::VolumeUp => "volume_up",
            Action::VolumeDown => "volume_down",
            Action::NextTab => "next_tab",
            Action::PreviousTab => "previous_tab",
            Action::MoveCursor { .. } => "move_cursor",
            Action::None => "none",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::MoveCursor { x, y } => write!(f, "move_cursor({}, {})", x, y),
            other => f.write_str(other.as_str()),
        }
    }
}

/// The actions a rule table may name (everything except pointer movement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ScrollUp,
    ScrollDown,
    VolumeUp,
    VolumeDown,
    NextTab,
    PreviousTab,
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::ScrollUp => Action::ScrollUp,
            ActionKind::ScrollDown => Action::ScrollDown,
            ActionKind::VolumeUp => Action::VolumeUp,
            ActionKind::VolumeDown => Action::VolumeDown,
            ActionKind::NextTab => Action::NextTab,
            ActionKind::PreviousTab => Action::PreviousTab,
        }
    }
}

/// Keys the sinks know how to press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    #[serde(alias = "ctrl")]
    Control,
    Shift,
    Alt,
    #[serde(alias = "cmd", alias = "super")]
    Meta,
    Tab,
    VolumeUp,
    VolumeDown,
    VolumeMute,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Control => "ctrl",
            Key::Shift => "shift",
            Key::Alt => "alt",
            Key::Meta => "meta",
            Key::Tab => "tab",
            Key::VolumeUp => "volume_up",
            Key::VolumeDown => "volume_down",
            Key::VolumeMute => "volume_mute",
        }
    }
}

/// How actions map onto sink calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Wheel notches per scroll action
    pub scroll_amount: u32,
    /// Key presses per volume action
    pub volume_steps: u32,
    /// Combo for NextTab
    pub next_tab: Vec<Key>,
    /// Combo for PreviousTab
    pub previous_tab: Vec<Key>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            scroll_amount: 5,
            volume_steps: 3,
            next_tab: vec![Key::Control, Key::Tab],
            previous_tab: vec![Key::Control, Key::Shift, Key::Tab],
        }
    }
}

/// Executes actions against a sink
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Execute one action. `Action::None` is a no-op.
    pub fn dispatch<S: ActionSink + ?Sized>(&self, action: Action, sink: &mut S) -> crate::Result<()> {
        match action {
            Action::None => return Ok(()),
            Action::ScrollUp => sink.scroll_by(self.config.scroll_amount, ScrollDirection::Up)?,
            Action::ScrollDown => sink.scroll_by(self.config.scroll_amount, ScrollDirection::Down)?,
            Action::VolumeUp => {
                for _ in 0..self.config.volume_steps {
                    sink.press_key(Key::VolumeUp)?;
                }
            }
            Action::VolumeDown => {
                for _ in 0..self.config.volume_steps {
                    sink.press_key(Key::VolumeDown)?;
                }
            }
            Action::NextTab => sink.send_hotkey(&self.config.next_tab)?,
            Action::PreviousTab => sink.send_hotkey(&self.config.previous_tab)?,
            Action::MoveCursor { x, y } => {
                sink.move_cursor_to(x, y)?;
                // Pointer moves arrive every frame; keep them out of info logs.
                debug!("Cursor -> ({}, {})", x, y);
                return Ok(());
            }
        }
        info!("Action: {}", action);
        Ok(())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::sink::{RecordingSink, SinkCall};

    #[test]
    fn test_scroll_dispatch() {
        let dispatcher = Dispatcher::default();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch(Action::ScrollUp, &mut sink).unwrap();
        dispatcher.dispatch(Action::ScrollDown, &mut sink).unwrap();
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Scroll { amount: 5, direction: ScrollDirection::Up },
                SinkCall::Scroll { amount: 5, direction: ScrollDirection::Down },
            ]
        );
    }

    #[test]
    fn test_volume_presses_repeat() {
        let dispatcher = Dispatcher::new(DispatchConfig {
            volume_steps: 3,
            ..Default::default()
        });
        let mut sink = RecordingSink::new();
        dispatcher.dispatch(Action::VolumeDown, &mut sink).unwrap();
        assert_eq!(sink.calls(), vec![SinkCall::Key(Key::VolumeDown); 3]);
    }

    #[test]
    fn test_tab_hotkeys() {
        let dispatcher = Dispatcher::default();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch(Action::NextTab, &mut sink).unwrap();
        dispatcher.dispatch(Action::PreviousTab, &mut sink).unwrap();
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Hotkey(vec![Key::Control, Key::Tab]),
                SinkCall::Hotkey(vec![Key::Control, Key::Shift, Key::Tab]),
            ]
        );
    }

    #[test]
    fn test_none_and_cursor() {
        let dispatcher = Dispatcher::default();
        let mut sink = RecordingSink::new();
        dispatcher.dispatch(Action::None, &mut sink).unwrap();
        assert!(sink.calls().is_empty());
        dispatcher
            .dispatch(Action::MoveCursor { x: 10, y: 20 }, &mut sink)
            .unwrap();
        assert_eq!(sink.calls(), vec![SinkCall::MoveCursor { x: 10, y: 20 }]);
    }

    #[test]
    fn test_action_kind_conversion_and_names() {
        assert_eq!(Action::from(ActionKind::PreviousTab), Action::PreviousTab);
        assert_eq!(Action::VolumeUp.to_string(), "volume_up");
        assert_eq!(Action::MoveCursor { x: 1, y: 2 }.to_string(), "move_cursor(1, 2)");
        assert!(Action::None.is_none());
        assert!(Action::ScrollUp.is_some());
    }

    #[test]
    fn test_key_aliases_deserialize() {
        #[derive(Deserialize)]
        struct Combo {
            keys: Vec<Key>,
        }
        let combo: Combo = toml::from_str(r#"keys = ["ctrl", "shift", "tab", "cmd"]"#).unwrap();
        assert_eq!(combo.keys, vec![Key::Control, Key::Shift, Key::Tab, Key::Meta]);
    }
}
