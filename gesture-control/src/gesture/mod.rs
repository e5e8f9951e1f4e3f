//! Gesture recognition
//!
//! The rule table, the per-frame gesture state machine, the air-mouse
//! mapping, and the worker thread that drives them from a landmark source.

pub mod rules;
pub mod cursor;
pub mod machine;
pub mod replay;
pub mod worker;

pub use cursor::{CursorConfig, CursorMapper};
pub use machine::{GestureContext, GestureInput, GestureMachine};
pub use replay::{replay, ReplayEvent, ReplayReport};
pub use rules::{Behavior, FingerPattern, GestureConfig, GestureRule, Profile};
pub use worker::{CancellationToken, GestureWorker, SessionConfig, SessionFactory, WorkerExit};
