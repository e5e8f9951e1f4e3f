//! Air-mouse mapping
//!
//! Maps the index fingertip from a reduced camera rectangle onto the screen.
//! The rectangle is the camera frame shrunk by `frame_margin_px` on every
//! side, so the pointer can reach the screen edges without the hand leaving
//! the frame.

use crate::hand::landmarks::Point;
use serde::{Deserialize, Serialize};

/// `[cursor]` configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Enable the index-finger pointer rule
    pub enabled: bool,
    /// Camera frame size the landmarks are expressed in
    pub camera_width: i32,
    pub camera_height: i32,
    /// Border excluded from the active rectangle (pixels)
    pub frame_margin_px: i32,
    /// Divisor applied to each step towards the target (1 = no smoothing)
    pub smoothing: f64,
    /// Flip horizontally (for an unmirrored camera image)
    pub mirror: bool,
    /// Screen size; 0 means ask the action sink
    pub screen_width: i32,
    pub screen_height: i32,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            camera_width: 640,
            camera_height: 480,
            frame_margin_px: 100,
            smoothing: 5.0,
            mirror: false,
            screen_width: 0,
            screen_height: 0,
        }
    }
}

impl CursorConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.camera_width <= 0 || self.camera_height <= 0 {
            return Err(crate::Error::Config(format!(
                "camera size must be positive, got {}x{}",
                self.camera_width, self.camera_height
            )));
        }
        if self.frame_margin_px < 0
            || self.frame_margin_px * 2 >= self.camera_width
            || self.frame_margin_px * 2 >= self.camera_height
        {
            return Err(crate::Error::Config(format!(
                "frame_margin_px {} leaves no active area in a {}x{} frame",
                self.frame_margin_px, self.camera_width, self.camera_height
            )));
        }
        if !(self.smoothing >= 1.0) {
            return Err(crate::Error::Config(format!(
                "smoothing must be >= 1, got {}",
                self.smoothing
            )));
        }
        if self.screen_width < 0 || self.screen_height < 0 {
            return Err(crate::Error::Config("screen size must not be negative".into()));
        }
        Ok(())
    }

    /// Configured screen size, if both dimensions are set
    pub fn screen(&self) -> Option<(i32, i32)> {
        (self.screen_width > 0 && self.screen_height > 0).then_some((self.screen_width, self.screen_height))
    }
}

/// Stateful fingertip -> screen mapper with exponential smoothing
#[derive(Debug, Clone)]
pub struct CursorMapper {
    config: CursorConfig,
    screen: (f64, f64),
    previous: Option<(f64, f64)>,
}

impl CursorMapper {
    pub fn new(config: CursorConfig, screen_width: i32, screen_height: i32) -> Self {
        Self {
            config,
            screen: (screen_width as f64, screen_height as f64),
            previous: None,
        }
    }

    /// Unsmoothed screen target for a fingertip
    pub fn target(&self, tip: Point) -> (f64, f64) {
        let margin = self.config.frame_margin_px as f64;
        let cam_w = self.config.camera_width as f64;
        let cam_h = self.config.camera_height as f64;

        let x = if self.config.mirror { cam_w - tip.x as f64 } else { tip.x as f64 };
        let y = tip.y as f64;

        (
            interpolate(x, margin, cam_w - margin, self.screen.0),
            interpolate(y, margin, cam_h - margin, self.screen.1),
        )
    }

    /// Next smoothed cursor position. The first call after a reset jumps
    /// straight to the target.
    pub fn update(&mut self, tip: Point) -> (i32, i32) {
        let target = self.target(tip);
        let next = match self.previous {
            None => target,
            Some((px, py)) => (
                px + (target.0 - px) / self.config.smoothing,
                py + (target.1 - py) / self.config.smoothing,
            ),
        };
        self.previous = Some(next);
        (next.0.round() as i32, next.1.round() as i32)
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// Linear map of `value` from `[lo, hi]` to `[0, out]`, clamped.
fn interpolate(value: f64, lo: f64, hi: f64, out: f64) -> f64 {
    let t = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    t * out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CursorMapper {
        CursorMapper::new(CursorConfig::default(), 1920, 1080)
    }

    #[test]
    fn test_target_maps_active_rectangle_to_screen() {
        let m = mapper();
        assert_eq!(m.target(Point::new(100, 100)), (0.0, 0.0));
        assert_eq!(m.target(Point::new(540, 380)), (1920.0, 1080.0));
        assert_eq!(m.target(Point::new(320, 240)), (960.0, 540.0));
    }

    #[test]
    fn test_target_clamps_outside_rectangle() {
        let m = mapper();
        assert_eq!(m.target(Point::new(0, 479)), (0.0, 1080.0));
    }

    #[test]
    fn test_mirror_flips_x() {
        let config = CursorConfig {
            mirror: true,
            ..Default::default()
        };
        let m = CursorMapper::new(config, 1920, 1080);
        assert_eq!(m.target(Point::new(540, 240)).0, 0.0);
    }

    #[test]
    fn test_update_smooths_after_first_frame() {
        let mut m = mapper();
        assert_eq!(m.update(Point::new(100, 100)), (0, 0));
        // One fifth of the way towards the far corner.
        assert_eq!(m.update(Point::new(540, 380)), (384, 216));
        m.reset();
        assert_eq!(m.update(Point::new(540, 380)), (1920, 1080));
    }

    #[test]
    fn test_validate() {
        assert!(CursorConfig::default().validate().is_ok());
        let bad_margin = CursorConfig {
            frame_margin_px: 240,
            ..Default::default()
        };
        assert!(bad_margin.validate().is_err());
        let bad_smoothing = CursorConfig {
            smoothing: 0.5,
            ..Default::default()
        };
        assert!(bad_smoothing.validate().is_err());
    }

    #[test]
    fn test_screen_requires_both_dimensions() {
        let mut config = CursorConfig::default();
        assert_eq!(config.screen(), None);
        config.screen_width = 1280;
        assert_eq!(config.screen(), None);
        config.screen_height = 720;
        assert_eq!(config.screen(), Some((1280, 720)));
    }
}
