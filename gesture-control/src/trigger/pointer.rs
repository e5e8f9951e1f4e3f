//! Global pointer-button listener
//!
//! `rdev::listen` blocks its thread for the life of the process and cannot
//! be stopped, so the listener thread is never joined on shutdown. It only
//! ends on its own when the OS hook fails (typically missing input
//! permissions), and that is reported through [`PointerListener::check`].

use super::ring_buffer::TriggerProducer;
use super::types::{PointerButton, PointerEvent};
use rdev::{Button, EventType};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{info, trace, warn};

/// Handle to the listener thread
pub struct PointerListener {
    handle: Option<JoinHandle<crate::Result<()>>>,
}

impl PointerListener {
    /// Spawn the listener; every button press/release goes into `producer`.
    ///
    /// # Errors
    /// Returns `Error::Trigger` if the thread cannot be spawned.
    pub fn spawn(mut producer: TriggerProducer<PointerEvent>) -> crate::Result<Self> {
        let handle = thread::Builder::new()
            .name("pointer-listener".into())
            .spawn(move || {
                let mut dropped = 0u64;
                let result = rdev::listen(move |event| {
                    let Some((button, pressed)) = convert_event_type(&event.event_type) else {
                        return;
                    };
                    let pointer = PointerEvent {
                        button,
                        pressed,
                        timestamp: Instant::now(),
                    };
                    trace!("Pointer {:?}", pointer);
                    if !producer.push(pointer) {
                        dropped += 1;
                        warn!("Trigger queue full, dropped pointer event ({} total)", dropped);
                    }
                });
                match result {
                    Ok(()) => Err(crate::Error::Trigger("pointer listener stopped".into())),
                    Err(e) => Err(crate::Error::Trigger(format!(
                        "could not listen for pointer events ({:?}); grant input monitoring / accessibility permission, or run with access to /dev/input",
                        e
                    ))),
                }
            })
            .map_err(|e| crate::Error::Trigger(format!("failed to spawn pointer listener: {}", e)))?;

        info!("Pointer listener started");
        Ok(Self { handle: Some(handle) })
    }

    /// Returns the listener's error once its thread has ended.
    pub fn check(&mut self) -> crate::Result<()> {
        let finished = self.handle.as_ref().is_some_and(|h| h.is_finished());
        if !finished {
            return Ok(());
        }
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(crate::Error::Trigger("pointer listener panicked".into())),
            None => Ok(()),
        }
    }
}

/// Map an rdev event to `(button, pressed)`; non-button events yield `None`.
pub fn convert_event_type(event_type: &EventType) -> Option<(PointerButton, bool)> {
    match event_type {
        EventType::ButtonPress(button) => Some((convert_button(*button), true)),
        EventType::ButtonRelease(button) => Some((convert_button(*button), false)),
        _ => None,
    }
}

fn convert_button(button: Button) -> PointerButton {
    match button {
        Button::Left => PointerButton::Left,
        Button::Right => PointerButton::Right,
        Button::Middle => PointerButton::Middle,
        Button::Unknown(code) => PointerButton::Other(code),
    }
}
