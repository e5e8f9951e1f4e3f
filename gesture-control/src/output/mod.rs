//! Action output
//!
//! Discrete actions produced by the gesture machine and the sinks that turn
//! them into OS input.

pub mod action;
pub mod sink;
pub mod enigo_sink;

pub use action::{Action, ActionKind, DispatchConfig, Dispatcher, Key};
pub use enigo_sink::EnigoSink;
pub use sink::{ActionSink, LogSink, RecordingSink, ScrollDirection, SinkCall};
