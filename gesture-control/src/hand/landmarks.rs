//! Hand landmark types
//!
//! A detected hand is exactly 21 keypoints with fixed anatomical ids,
//! positioned in frame pixels (origin top-left, y grows downward).

use serde::{Deserialize, Serialize};

/// Number of keypoints in one detected hand
pub const LANDMARK_COUNT: usize = 21;

/// Wrist keypoint
pub const WRIST: usize = 0;
/// Thumb tip keypoint
pub const THUMB_TIP: usize = 4;
/// Index fingertip keypoint
pub const INDEX_TIP: usize = 8;
/// Middle fingertip keypoint
pub const MIDDLE_TIP: usize = 12;
/// Ring fingertip keypoint
pub const RING_TIP: usize = 16;
/// Pinky tip keypoint
pub const PINKY_TIP: usize = 20;

/// Fingertip ids, thumb to pinky
pub const TIP_IDS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// A 2D position in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Integer midpoint (floor division, as pixel coordinates are)
    pub fn midpoint(&self, other: Point) -> Point {
        Point {
            x: floor_half(self.x, other.x),
            y: floor_half(self.y, other.y),
        }
    }
}

fn floor_half(a: i32, b: i32) -> i32 {
    // The floored mean of two i32 values always fits in i32.
    (a as i64 + b as i64).div_euclid(2) as i32
}

/// A single labeled keypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Landmark {
    /// Anatomical id (0-20)
    pub id: u8,
    /// Position in frame pixels
    pub position: Point,
}

impl Landmark {
    pub const fn new(id: u8, x: i32, y: i32) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

/// The 21 landmarks of one detected hand, validated and ordered by id.
///
/// Immutable once built; a new value is produced for every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Build from a landmark sequence.
    ///
    /// # Errors
    /// Returns `Error::Landmarks` unless there are exactly 21 landmarks
    /// whose ids run 0..=20 in order.
    pub fn new(landmarks: &[Landmark]) -> crate::Result<Self> {
        if landmarks.len() != LANDMARK_COUNT {
            return Err(crate::Error::Landmarks(format!(
                "expected {} landmarks, got {}",
                LANDMARK_COUNT,
                landmarks.len()
            )));
        }

        let mut points = [Landmark::new(0, 0, 0); LANDMARK_COUNT];
        for (index, landmark) in landmarks.iter().enumerate() {
            if landmark.id as usize != index {
                return Err(crate::Error::Landmarks(format!(
                    "landmark at position {} has id {}",
                    index, landmark.id
                )));
            }
            points[index] = *landmark;
        }

        Ok(Self { points })
    }

    /// Build from `(id, x, y)` triples, the shape detectors usually emit.
    pub fn from_triples(triples: &[[i32; 3]]) -> crate::Result<Self> {
        let landmarks = triples
            .iter()
            .map(|&[id, x, y]| {
                u8::try_from(id)
                    .map(|id| Landmark::new(id, x, y))
                    .map_err(|_| crate::Error::Landmarks(format!("landmark id {} out of range", id)))
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Self::new(&landmarks)
    }

    /// Position of a keypoint by id.
    ///
    /// # Panics
    /// Panics if `id >= 21`; ids are compile-time constants in practice.
    #[inline]
    pub fn point(&self, id: usize) -> Point {
        self.points[id].position
    }

    /// All landmarks in id order
    pub fn landmarks(&self) -> &[Landmark] {
        &self.points
    }

    pub fn index_tip(&self) -> Point {
        self.point(INDEX_TIP)
    }

    pub fn middle_tip(&self) -> Point {
        self.point(MIDDLE_TIP)
    }
}
