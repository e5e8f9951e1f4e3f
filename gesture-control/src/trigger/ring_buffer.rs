//! Lock-free trigger queues
//!
//! Each trigger source (pointer listener thread, remote transport task) owns
//! the producer half of its own SPSC ring; the mode controller owns every
//! consumer half and drains them on its own thread.
//!
//! - Producer: never blocks. A full ring drops the event and counts it.
//! - Consumer: polled every controller tick with `pop_batch`.

use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default ring capacity (must be a power of 2)
pub const DEFAULT_CAPACITY: usize = 256;

/// Queued trigger with its arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSlot<T> {
    pub item: T,
    pub sequence: u64,
}

/// Ring statistics for monitoring
#[derive(Debug, Default)]
pub struct TriggerStats {
    pub pushed: AtomicU64,
    /// Dropped because the ring was full
    pub dropped: AtomicU64,
    pub consumed: AtomicU64,
    pub peak_occupancy: AtomicU64,
}

impl TriggerStats {
    pub fn snapshot(&self) -> (u64, u64, u64) {
        (
            self.pushed.load(Ordering::Relaxed),
            self.dropped.load(Ordering::Relaxed),
            self.consumed.load(Ordering::Relaxed),
        )
    }
}

/// SPSC ring for one trigger source
pub struct TriggerRing<T> {
    producer: Producer<TriggerSlot<T>>,
    consumer: Consumer<TriggerSlot<T>>,
    stats: Arc<TriggerStats>,
    capacity: usize,
}

impl<T> TriggerRing<T> {
    pub fn new() -> Self {
        let (producer, consumer) = RingBuffer::new(DEFAULT_CAPACITY);
        Self {
            producer,
            consumer,
            stats: Arc::new(TriggerStats::default()),
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Create a ring with the given capacity.
    ///
    /// # Errors
    /// Returns `Error::Config` if `capacity` is not a power of 2.
    pub fn with_capacity(capacity: usize) -> crate::Result<Self> {
        if !capacity.is_power_of_two() {
            return Err(crate::Error::Config(format!(
                "trigger ring capacity must be a power of 2, got {}",
                capacity
            )));
        }
        let (producer, consumer) = RingBuffer::new(capacity);
        Ok(Self {
            producer,
            consumer,
            stats: Arc::new(TriggerStats::default()),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> Arc<TriggerStats> {
        Arc::clone(&self.stats)
    }

    /// Split into the producer (trigger source) and consumer (controller).
    pub fn split(self) -> (TriggerProducer<T>, TriggerConsumer<T>) {
        (
            TriggerProducer {
                inner: self.producer,
                sequence: 0,
                stats: Arc::clone(&self.stats),
                capacity: self.capacity,
            },
            TriggerConsumer {
                inner: self.consumer,
                stats: self.stats,
            },
        )
    }
}

impl<T> Default for TriggerRing<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half, owned by one trigger source
pub struct TriggerProducer<T> {
    inner: Producer<TriggerSlot<T>>,
    sequence: u64,
    stats: Arc<TriggerStats>,
    capacity: usize,
}

impl<T> TriggerProducer<T> {
    /// Push without blocking. Returns false if the ring was full and the
    /// item was dropped.
    #[inline]
    pub fn push(&mut self, item: T) -> bool {
        let slot = TriggerSlot {
            item,
            sequence: self.sequence,
        };
        match self.inner.push(slot) {
            Ok(()) => {
                self.sequence += 1;
                self.stats.pushed.fetch_add(1, Ordering::Relaxed);
                let occupied = (self.capacity - self.inner.slots()) as u64;
                self.stats.peak_occupancy.fetch_max(occupied, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Whether the consumer half has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.inner.is_abandoned()
    }
}

/// Consumer half, owned by the mode controller
pub struct TriggerConsumer<T> {
    inner: Consumer<TriggerSlot<T>>,
    stats: Arc<TriggerStats>,
}

impl<T> TriggerConsumer<T> {
    #[inline]
    pub fn pop(&mut self) -> Option<TriggerSlot<T>> {
        let slot = self.inner.pop().ok()?;
        self.stats.consumed.fetch_add(1, Ordering::Relaxed);
        Some(slot)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Counters shared with the producer half
    pub fn stats(&self) -> &TriggerStats {
        &self.stats
    }

    pub fn available(&self) -> usize {
        self.inner.slots()
    }

    /// Pop up to `max_count` items in arrival order
    pub fn pop_batch(&mut self, max_count: usize) -> Vec<TriggerSlot<T>> {
        let mut batch = Vec::with_capacity(max_count.min(self.available()));
        while batch.len() < max_count {
            match self.pop() {
                Some(slot) => batch.push(slot),
                None => break,
            }
        }
        batch
    }
}
