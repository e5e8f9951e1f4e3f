//! Timing helpers
//!
//! Debounce windows for repeated actions and frame-rate measurement for the
//! gesture loop. Everything is driven by caller-supplied `Instant`s so the
//! state machines stay deterministic under test.

pub mod cooldown;
pub mod fps;

pub use cooldown::Cooldown;
pub use fps::FpsMeter;
