//! Mode triggers
//!
//! Two independent sources ask the mode controller to switch:
//! - a global pointer listener whose middle-click bursts toggle the mode
//! - a remote notification channel that forces a mode
//!
//! Each source pushes into its own lock-free ring; [`TriggerInputs`] bundles
//! the consumer halves together with the listener handles.

pub mod types;
pub mod ring_buffer;
pub mod click_burst;
pub mod pointer;
pub mod remote;

pub use click_burst::ClickBurstDetector;
pub use pointer::PointerListener;
pub use remote::RemoteListener;
pub use ring_buffer::{TriggerConsumer, TriggerProducer, TriggerRing};
pub use types::{ModeCommand, PointerButton, PointerEvent};

use ring_buffer::TriggerStats;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

/// Everything the controller drains each tick
#[derive(Default)]
pub struct TriggerInputs {
    pub pointer: Option<TriggerConsumer<PointerEvent>>,
    pub remote: Option<TriggerConsumer<ModeCommand>>,
    pub pointer_listener: Option<PointerListener>,
    pub remote_listener: Option<RemoteListener>,
}

impl TriggerInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pointer(mut self, consumer: TriggerConsumer<PointerEvent>) -> Self {
        self.pointer = Some(consumer);
        self
    }

    pub fn with_remote(mut self, consumer: TriggerConsumer<ModeCommand>) -> Self {
        self.remote = Some(consumer);
        self
    }

    /// Start the rdev listener feeding a new pointer ring.
    pub fn spawn_pointer(mut self, capacity: usize) -> crate::Result<Self> {
        let (producer, consumer) = TriggerRing::with_capacity(capacity)?.split();
        self.pointer_listener = Some(PointerListener::spawn(producer)?);
        self.pointer = Some(consumer);
        Ok(self)
    }

    /// Start the remote listener feeding a new command ring.
    pub fn spawn_remote(
        mut self,
        capacity: usize,
        address: String,
        retry_delay: std::time::Duration,
    ) -> crate::Result<Self> {
        let (producer, consumer) = TriggerRing::with_capacity(capacity)?.split();
        self.remote_listener = Some(RemoteListener::spawn(address, retry_delay, producer)?);
        self.remote = Some(consumer);
        Ok(self)
    }

    /// Fails once a listener that cannot recover has died.
    pub fn check(&mut self) -> crate::Result<()> {
        match self.pointer_listener.as_mut() {
            Some(listener) => listener.check(),
            None => Ok(()),
        }
    }

    /// Log per-ring counters; dropped triggers are a warning.
    pub fn log_stats(&self) {
        if let Some(pointer) = self.pointer.as_ref() {
            log_ring("pointer", pointer.stats());
        }
        if let Some(remote) = self.remote.as_ref() {
            log_ring("remote", remote.stats());
        }
    }

    /// Stop listeners that can be stopped.
    pub fn shutdown(&mut self) {
        if let Some(mut remote) = self.remote_listener.take() {
            remote.shutdown();
        }
    }
}

fn log_ring(name: &str, stats: &TriggerStats) {
    let (pushed, dropped, consumed) = stats.snapshot();
    let peak = stats.peak_occupancy.load(Ordering::Relaxed);
    if dropped > 0 {
        warn!(
            "{} triggers: {} queued, {} dropped (ring full), {} handled, peak {}",
            name, pushed, dropped, consumed, peak
        );
    } else {
        info!("{} triggers: {} queued, {} handled, peak {}", name, pushed, consumed, peak);
    }
}
