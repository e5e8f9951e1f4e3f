//! # Gesture Control
//!
//! Desktop input automation driven by hand poses. A per-frame stream of hand
//! landmarks is classified into "which fingers are up", run through a
//! debounced gesture state machine, and turned into OS input actions
//! (scroll, volume keys, tab-switch hotkeys, pointer movement).
//!
//! Gesture control is only active while the [`mode::ModeController`] is in
//! [`mode::Mode::Gesture`]. The mode is switched either by a rapid burst of
//! middle clicks or by a remote "Gesture Mode ON" / "Gesture Mode OFF"
//! notification.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Landmark   │───▶│    Pose     │───▶│   Gesture   │───▶│   Action    │
//! │   Source    │    │ Classifier  │    │   Machine   │    │    Sink     │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                              ▲
//!                        start / stop          │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Click burst │───▶│ SPSC rings  │───▶│    Mode     │
//! │ / remote    │    │  (rtrb)     │    │ Controller  │
//! └─────────────┘    └─────────────┘    └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`hand`]: landmark types, the pose classifier and landmark sources
//! - [`gesture`]: rule table, gesture state machine and the per-frame loop
//! - [`output`]: actions and the sinks that execute them
//! - [`trigger`]: pointer / remote trigger sources and the click-burst counter
//! - [`mode`]: the Mouse/Gesture mode controller
//! - [`time`]: cooldowns and frame-rate measurement
//! - [`app`]: CLI and configuration management

pub mod time;
pub mod hand;
pub mod gesture;
pub mod output;
pub mod trigger;
pub mod mode;
pub mod app;

pub use gesture::machine::GestureMachine;
pub use hand::classifier::{classify, FingerState};
pub use hand::landmarks::{HandLandmarks, Landmark};
pub use mode::{Mode, ModeController};
pub use output::action::Action;

/// Result type alias for gesture control
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for gesture control
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid landmarks: {0}")]
    Landmarks(String),

    #[error("Frame read error: {0}")]
    FrameRead(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Input injection error: {0}")]
    Injection(String),

    #[error("Trigger error: {0}")]
    Trigger(String),

    #[error("Gesture session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
