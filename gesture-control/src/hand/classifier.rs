//! Pose Classifier
//!
//! Turns the 21 landmarks of one hand into a 5-bit "which fingers are up"
//! vector. Recomputed independently every frame: no smoothing, no
//! hysteresis.
//!
//! The thumb test compares horizontal coordinates only (tip right of the
//! joint below it). That holds for an upright right hand facing the camera
//! (or a mirrored left hand) and is not meant to survive rotation.

use super::landmarks::{HandLandmarks, TIP_IDS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extended/curled state of the five fingers, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FingerState([bool; 5]);

impl FingerState {
    pub const fn new(fingers: [bool; 5]) -> Self {
        Self(fingers)
    }

    /// Build from `0`/`1` digits, thumb first. Any non-zero digit is "up".
    pub const fn from_digits(digits: [u8; 5]) -> Self {
        Self([
            digits[0] != 0,
            digits[1] != 0,
            digits[2] != 0,
            digits[3] != 0,
            digits[4] != 0,
        ])
    }

    pub fn is_extended(&self, finger: usize) -> bool {
        self.0[finger]
    }

    pub fn fingers(&self) -> [bool; 5] {
        self.0
    }

    pub fn thumb(&self) -> bool {
        self.0[0]
    }

    pub fn index(&self) -> bool {
        self.0[1]
    }

    pub fn middle(&self) -> bool {
        self.0[2]
    }

    pub fn ring(&self) -> bool {
        self.0[3]
    }

    pub fn pinky(&self) -> bool {
        self.0[4]
    }

    /// All 32 possible states, in binary counting order
    pub fn all() -> impl Iterator<Item = FingerState> {
        (0u8..32).map(|bits| {
            let mut fingers = [false; 5];
            for (i, finger) in fingers.iter_mut().enumerate() {
                *finger = bits & (1 << (4 - i)) != 0;
            }
            FingerState(fingers)
        })
    }
}

impl fmt::Display for FingerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for up in self.0 {
            f.write_str(if up { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Classify which fingers are extended.
///
/// - Thumb: tip x greater than the x of the joint one position closer to
///   the palm.
/// - Other fingers: tip y strictly less (higher on screen) than the y of
///   the joint two positions closer to the palm.
pub fn classify(hand: &HandLandmarks) -> FingerState {
    let mut fingers = [false; 5];

    let thumb_tip = TIP_IDS[0];
    fingers[0] = hand.point(thumb_tip).x > hand.point(thumb_tip - 1).x;

    for finger in 1..5 {
        let tip = TIP_IDS[finger];
        fingers[finger] = hand.point(tip).y < hand.point(tip - 2).y;
    }

    FingerState(fingers)
}
