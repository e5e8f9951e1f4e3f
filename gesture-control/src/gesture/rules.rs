//! Gesture rule table
//!
//! A rule pairs a finger pattern with a behavior and a cooldown. Rules are
//! evaluated in order each frame and the first match wins, so a hand moving
//! through several poses never fires two conflicting actions in one frame.
//!
//! Two built-in profiles reproduce the observed mappings; a `custom` profile
//! takes the table from configuration. Which vertical direction maps to
//! which action is a per-rule setting (`on_up` / `on_down`), not code.

use crate::hand::classifier::FingerState;
use crate::output::action::ActionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Five-position finger pattern over thumb..pinky.
///
/// Written as a string: `1` extended, `0` curled, `?` don't care.
/// `"?1100"` is index+middle up, ring and pinky down, thumb ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FingerPattern([Option<bool>; 5]);

impl FingerPattern {
    pub const fn new(fingers: [Option<bool>; 5]) -> Self {
        Self(fingers)
    }

    /// Pattern from a byte literal such as `b"?1100"`. Any byte other than
    /// `1` or `0` is a don't-care.
    pub const fn literal(bytes: &[u8; 5]) -> Self {
        let mut fingers = [None; 5];
        let mut i = 0;
        while i < 5 {
            fingers[i] = match bytes[i] {
                b'1' => Some(true),
                b'0' => Some(false),
                _ => None,
            };
            i += 1;
        }
        Self(fingers)
    }

    /// Pattern that requires exactly this state
    pub fn exact(state: FingerState) -> Self {
        Self(state.fingers().map(Some))
    }

    pub fn matches(&self, state: FingerState) -> bool {
        self.0
            .iter()
            .zip(state.fingers())
            .all(|(want, up)| want.map_or(true, |want| want == up))
    }
}

impl FromStr for FingerPattern {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() != 5 {
            return Err(crate::Error::Config(format!(
                "finger pattern '{}' must have 5 positions (thumb..pinky)",
                s
            )));
        }
        let mut fingers = [None; 5];
        for (slot, c) in fingers.iter_mut().zip(chars) {
            *slot = match c {
                '1' => Some(true),
                '0' => Some(false),
                '?' | 'x' | '*' => None,
                other => {
                    return Err(crate::Error::Config(format!(
                        "finger pattern '{}' has invalid character '{}'",
                        s, other
                    )))
                }
            };
        }
        Ok(Self(fingers))
    }
}

impl TryFrom<String> for FingerPattern {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FingerPattern> for String {
    fn from(pattern: FingerPattern) -> Self {
        pattern.to_string()
    }
}

impl fmt::Display for FingerPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finger in self.0 {
            f.write_str(match finger {
                Some(true) => "1",
                Some(false) => "0",
                None => "?",
            })?;
        }
        Ok(())
    }
}

/// What a matched rule does with the frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Behavior {
    /// Fire one action, then wait out the cooldown
    Discrete { action: ActionKind },
    /// Track the index/middle tip midpoint and fire on vertical movement
    /// larger than the threshold. The first frame only seeds the reference.
    VerticalDelta {
        threshold_px: i32,
        /// Fired when the hand moves up the screen (y decreasing)
        on_up: ActionKind,
        /// Fired when the hand moves down the screen (y increasing)
        on_down: ActionKind,
    },
    /// Drive the pointer from the index tip
    Pointer,
}

/// One row of the rule table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureRule {
    pub name: String,
    pub pattern: FingerPattern,
    #[serde(default)]
    pub cooldown_ms: u64,
    pub behavior: Behavior,
}

impl GestureRule {
    pub fn discrete(name: &str, pattern: FingerPattern, action: ActionKind, cooldown_ms: u64) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            cooldown_ms,
            behavior: Behavior::Discrete { action },
        }
    }

    pub fn vertical_delta(
        name: &str,
        pattern: FingerPattern,
        threshold_px: i32,
        on_up: ActionKind,
        on_down: ActionKind,
        cooldown_ms: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            cooldown_ms,
            behavior: Behavior::VerticalDelta {
                threshold_px,
                on_up,
                on_down,
            },
        }
    }

    pub fn pointer(name: &str, pattern: FingerPattern) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            cooldown_ms: 0,
            behavior: Behavior::Pointer,
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::Config("gesture rule name must not be empty".into()));
        }
        if let Behavior::VerticalDelta { threshold_px, .. } = self.behavior {
            if threshold_px <= 0 {
                return Err(crate::Error::Config(format!(
                    "rule '{}': threshold_px must be > 0, got {}",
                    self.name, threshold_px
                )));
            }
        }
        Ok(())
    }
}

/// Named rule tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Two-finger swipe drives volume, open hand / fist scroll
    #[default]
    Media,
    /// Two-finger swipe scrolls, open hand / fist drive volume
    Scroll,
    /// Use `[[gesture.rules]]` verbatim
    Custom,
}

const TWO_FINGERS: FingerPattern = FingerPattern::literal(b"?1100");
const OPEN_HAND: FingerPattern = FingerPattern::literal(b"11111");
const FIST: FingerPattern = FingerPattern::literal(b"00000");
const THUMB_INDEX: FingerPattern = FingerPattern::literal(b"11000");
const THUMB_INDEX_PINKY: FingerPattern = FingerPattern::literal(b"11001");
const INDEX_ONLY: FingerPattern = FingerPattern::literal(b"01000");

impl Profile {
    pub fn rules(&self) -> Vec<GestureRule> {
        use ActionKind::*;
        match self {
            Profile::Media => vec![
                GestureRule::vertical_delta("two_finger_swipe", TWO_FINGERS, 15, VolumeUp, VolumeDown, 150),
                GestureRule::discrete("open_hand", OPEN_HAND, ScrollUp, 150),
                GestureRule::discrete("fist", FIST, ScrollDown, 150),
                GestureRule::discrete("thumb_index", THUMB_INDEX, NextTab, 300),
                GestureRule::discrete("thumb_index_pinky", THUMB_INDEX_PINKY, PreviousTab, 300),
            ],
            Profile::Scroll => vec![
                GestureRule::vertical_delta("two_finger_swipe", TWO_FINGERS, 10, ScrollUp, ScrollDown, 30),
                GestureRule::discrete("open_hand", OPEN_HAND, VolumeUp, 200),
                GestureRule::discrete("fist", FIST, VolumeDown, 200),
                GestureRule::discrete("thumb_index", THUMB_INDEX, NextTab, 300),
                GestureRule::discrete("thumb_index_pinky", THUMB_INDEX_PINKY, PreviousTab, 300),
            ],
            Profile::Custom => Vec::new(),
        }
    }
}

/// `[gesture]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GestureConfig {
    pub profile: Profile,
    /// Rule table for the `custom` profile
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<GestureRule>,
}

impl GestureConfig {
    pub fn with_profile(profile: Profile) -> Self {
        Self {
            profile,
            rules: Vec::new(),
        }
    }

    pub fn custom(rules: Vec<GestureRule>) -> Self {
        Self {
            profile: Profile::Custom,
            rules,
        }
    }

    /// The table the machine will run, with the index-only pointer rule
    /// appended for built-in profiles when the air mouse is enabled.
    pub fn effective_rules(&self, pointer_enabled: bool) -> Vec<GestureRule> {
        match self.profile {
            Profile::Custom => self.rules.clone(),
            builtin => {
                let mut rules = builtin.rules();
                if pointer_enabled {
                    rules.push(GestureRule::pointer("index_pointer", INDEX_ONLY));
                }
                rules
            }
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.profile == Profile::Custom && self.rules.is_empty() {
            return Err(crate::Error::Config(
                "profile 'custom' requires at least one [[gesture.rules]] entry".into(),
            ));
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(digits: [u8; 5]) -> FingerState {
        FingerState::from_digits(digits)
    }

    #[test]
    fn test_pattern_parse_and_display() {
        let pattern: FingerPattern = "?1100".parse().unwrap();
        assert_eq!(pattern.to_string(), "?1100");
        assert!(pattern.matches(state([0, 1, 1, 0, 0])));
        assert!(pattern.matches(state([1, 1, 1, 0, 0])));
        assert!(!pattern.matches(state([0, 1, 1, 1, 0])));
    }

    #[test]
    fn test_pattern_rejects_bad_input() {
        assert!("1100".parse::<FingerPattern>().is_err());
        assert!("111000".parse::<FingerPattern>().is_err());
        assert!("11a00".parse::<FingerPattern>().is_err());
    }

    #[test]
    fn test_exact_pattern() {
        let s = state([1, 1, 0, 0, 1]);
        let pattern = FingerPattern::exact(s);
        assert!(pattern.matches(s));
        assert_eq!(FingerState::all().filter(|&st| pattern.matches(st)).count(), 1);
    }

    #[test]
    fn test_builtin_profiles_have_no_overlapping_exact_patterns() {
        for profile in [Profile::Media, Profile::Scroll] {
            let rules = profile.rules();
            assert_eq!(rules.len(), 5);
            for s in FingerState::all() {
                let matches = rules.iter().filter(|r| r.pattern.matches(s)).count();
                assert!(matches <= 1, "{:?} state {} matched {} rules", profile, s, matches);
            }
        }
    }

    #[test]
    fn test_profiles_disagree_on_swipe_mapping() {
        let media = &Profile::Media.rules()[0];
        let scroll = &Profile::Scroll.rules()[0];
        assert!(matches!(
            media.behavior,
            Behavior::VerticalDelta { on_up: ActionKind::VolumeUp, threshold_px: 15, .. }
        ));
        assert!(matches!(
            scroll.behavior,
            Behavior::VerticalDelta { on_up: ActionKind::ScrollUp, threshold_px: 10, .. }
        ));
    }

    #[test]
    fn test_effective_rules_pointer_toggle() {
        let config = GestureConfig::default();
        assert_eq!(config.effective_rules(false).len(), 5);
        let with_pointer = config.effective_rules(true);
        assert_eq!(with_pointer.len(), 6);
        assert_eq!(with_pointer[5].behavior, Behavior::Pointer);
    }

    #[test]
    fn test_custom_profile_requires_rules() {
        let config = GestureConfig::with_profile(Profile::Custom);
        assert!(config.validate().is_err());

        let config = GestureConfig::custom(vec![GestureRule::discrete(
            "peace",
            FingerPattern::literal(b"01100"),
            ActionKind::NextTab,
            300,
        )]);
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_rules(true).len(), 1);
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = GestureConfig::custom(vec![GestureRule::vertical_delta(
            "swipe",
            FingerPattern::literal(b"?1100"),
            0,
            ActionKind::ScrollUp,
            ActionKind::ScrollDown,
            0,
        )]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_rules_from_toml() {
        let toml_str = r#"
profile = "custom"

[[rules]]
name = "swipe"
pattern = "?1100"
cooldown_ms = 50
behavior = { kind = "vertical_delta", threshold_px = 12, on_up = "scroll_down", on_down = "scroll_up" }

[[rules]]
name = "fist"
pattern = "00000"
behavior = { kind = "discrete", action = "volume_down" }

[[rules]]
name = "point"
pattern = "01000"
behavior = { kind = "pointer" }
"#;
        let config: GestureConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        let rules = config.effective_rules(false);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].cooldown_ms, 50);
        assert_eq!(
            rules[0].behavior,
            Behavior::VerticalDelta {
                threshold_px: 12,
                on_up: ActionKind::ScrollDown,
                on_down: ActionKind::ScrollUp,
            }
        );
        assert_eq!(rules[1].cooldown_ms, 0);
        assert_eq!(rules[2].behavior, Behavior::Pointer);
    }

    #[test]
    fn test_bad_pattern_in_toml_fails() {
        let toml_str = r#"
profile = "custom"
[[rules]]
name = "broken"
pattern = "12345"
behavior = { kind = "pointer" }
"#;
        assert!(toml::from_str::<GestureConfig>(toml_str).is_err());
    }
}
