//! Gesture State Machine
//!
//! Consumes one classified frame at a time and emits at most one [`Action`].
//! Rules are tried in table order; the first pattern that matches the
//! frame's [`FingerState`] owns the frame.
//!
//! Temporal state lives in [`GestureContext`]:
//! - the vertical reference used by `vertical_delta` rules, cleared whenever
//!   the matching rule changes, no rule matches, or the hand disappears
//! - one [`Cooldown`] per rule, so a held pose fires once per window no
//!   matter how fast frames arrive

use super::cursor::CursorMapper;
use super::rules::{Behavior, GestureRule};
use crate::hand::classifier::{classify, FingerState};
use crate::hand::landmarks::{HandLandmarks, Point};
use crate::output::action::Action;
use crate::time::Cooldown;
use std::time::Instant;
use tracing::{debug, trace};

/// What the machine needs from one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureInput {
    pub fingers: FingerState,
    pub index_tip: Point,
    pub middle_tip: Point,
}

impl GestureInput {
    pub fn new(fingers: FingerState, index_tip: Point, middle_tip: Point) -> Self {
        Self {
            fingers,
            index_tip,
            middle_tip,
        }
    }

    pub fn from_landmarks(hand: &HandLandmarks) -> Self {
        Self {
            fingers: classify(hand),
            index_tip: hand.index_tip(),
            middle_tip: hand.middle_tip(),
        }
    }

    /// Vertical position tracked by `vertical_delta` rules
    pub fn tracked_y(&self) -> i32 {
        self.index_tip.midpoint(self.middle_tip).y
    }
}

/// State carried between frames for one gesture session
#[derive(Debug, Clone)]
pub struct GestureContext {
    prev_y: Option<i32>,
    active_rule: Option<usize>,
    cooldowns: Vec<Cooldown>,
}

impl GestureContext {
    fn new(rules: &[GestureRule]) -> Self {
        Self {
            prev_y: None,
            active_rule: None,
            cooldowns: rules.iter().map(|r| Cooldown::from_millis(r.cooldown_ms)).collect(),
        }
    }

    /// Vertical reference, `None` while unset
    pub fn prev_y(&self) -> Option<i32> {
        self.prev_y
    }

    /// Index of the rule that matched the previous frame
    pub fn active_rule(&self) -> Option<usize> {
        self.active_rule
    }

    fn clear_reference(&mut self) {
        self.prev_y = None;
        self.active_rule = None;
    }
}

/// Table-driven gesture recogniser
#[derive(Debug, Clone)]
pub struct GestureMachine {
    rules: Vec<GestureRule>,
    context: GestureContext,
    cursor: Option<CursorMapper>,
}

impl GestureMachine {
    pub fn new(rules: Vec<GestureRule>) -> Self {
        let context = GestureContext::new(&rules);
        Self {
            rules,
            context,
            cursor: None,
        }
    }

    /// Attach the mapper used by `pointer` rules. Without one, pointer rules
    /// match but emit nothing.
    pub fn with_cursor(mut self, cursor: CursorMapper) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn rules(&self) -> &[GestureRule] {
        &self.rules
    }

    pub fn context(&self) -> &GestureContext {
        &self.context
    }

    /// Forget all temporal state, including cooldowns.
    pub fn reset(&mut self) {
        self.context = GestureContext::new(&self.rules);
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.reset();
        }
    }

    /// Classify a frame's hand (if any) and step.
    pub fn step_landmarks(&mut self, hand: Option<&HandLandmarks>, now: Instant) -> Action {
        let input = hand.map(GestureInput::from_landmarks);
        self.step(input.as_ref(), now)
    }

    /// Advance one frame. `None` means no hand was detected.
    pub fn step(&mut self, input: Option<&GestureInput>, now: Instant) -> Action {
        let Some(input) = input else {
            self.release_active("no hand");
            return Action::None;
        };

        let Some(index) = self.rules.iter().position(|r| r.pattern.matches(input.fingers)) else {
            self.release_active("no matching rule");
            return Action::None;
        };

        if self.context.active_rule != Some(index) {
            self.context.clear_reference();
            if let Some(cursor) = self.cursor.as_mut() {
                cursor.reset();
            }
            self.context.active_rule = Some(index);
            debug!("Gesture {} ({})", self.rules[index].name, input.fingers);
        }

        let action = match &self.rules[index].behavior {
            Behavior::Discrete { action } => Action::from(*action),
            Behavior::VerticalDelta {
                threshold_px,
                on_up,
                on_down,
            } => {
                let y = input.tracked_y();
                // The reference always follows the hand, fired or not.
                match self.context.prev_y.replace(y) {
                    None => Action::None,
                    Some(prev) => {
                        let delta = i64::from(y) - i64::from(prev);
                        trace!("Vertical delta {} (threshold {})", delta, threshold_px);
                        if delta.abs() > i64::from(*threshold_px) {
                            // Screen y grows downwards.
                            Action::from(if delta < 0 { *on_up } else { *on_down })
                        } else {
                            Action::None
                        }
                    }
                }
            }
            Behavior::Pointer => match self.cursor.as_mut() {
                Some(cursor) => {
                    let (x, y) = cursor.update(input.index_tip);
                    Action::MoveCursor { x, y }
                }
                None => Action::None,
            },
        };

        if action.is_none() {
            return Action::None;
        }
        let cooldown = &mut self.context.cooldowns[index];
        if cooldown.try_fire(now) {
            action
        } else {
            trace!("{} suppressed by cooldown ({:?} left)", action, cooldown.remaining(now));
            Action::None
        }
    }

    fn release_active(&mut self, reason: &str) {
        if let Some(index) = self.context.active_rule {
            debug!("Gesture {} released ({})", self.rules[index].name, reason);
        }
        self.context.clear_reference();
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.reset();
        }
    }
}
