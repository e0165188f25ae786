//! Bounded, thread-safe event ring buffer.
//!
//! A single [`EventBuffer`] is shared between the streaming task
//! (producer) and any number of readers. The mutex is held only for the
//! duration of the in-memory ring operation, never across I/O, so
//! `add` cannot stall the receive loop and readers cannot block the
//! producer for longer than one ring operation.
//!
//! Overflow is not an error: once the buffer reaches capacity the
//! oldest entry is evicted silently. A lifetime counter of all records
//! ever admitted is kept for observability, independent of occupancy.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::record::EventRecord;

/// Default ring capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Occupancy statistics for a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferStats {
    /// Total records ever admitted, across clears and evictions.
    pub lifetime_count: u64,
    /// Records currently held.
    pub current_size: usize,
    /// Maximum records held at once.
    pub capacity: usize,
}

struct Inner {
    ring: VecDeque<Arc<EventRecord>>,
    lifetime_count: u64,
}

/// Fixed-capacity, insertion-ordered store of event records.
pub struct EventBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl EventBuffer {
    /// Creates a buffer holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                ring: VecDeque::with_capacity(capacity),
                lifetime_count: 0,
            }),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest entry at capacity.
    pub fn add(&self, record: EventRecord) {
        let record = Arc::new(record);
        let mut inner = self.lock();
        while inner.ring.len() >= self.capacity.max(1) {
            inner.ring.pop_front();
        }
        inner.ring.push_back(record);
        inner.lifetime_count += 1;
    }

    /// Returns up to the last `n` records in insertion order.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<Arc<EventRecord>> {
        let inner = self.lock();
        let skip = inner.ring.len().saturating_sub(n);
        inner.ring.iter().skip(skip).cloned().collect()
    }

    /// Returns all records captured strictly after `epoch_secs`, in
    /// insertion order.
    #[must_use]
    pub fn since(&self, epoch_secs: f64) -> Vec<Arc<EventRecord>> {
        let inner = self.lock();
        inner
            .ring
            .iter()
            .filter(|record| record.epoch_secs() > epoch_secs)
            .cloned()
            .collect()
    }

    /// Empties the ring. The lifetime counter is preserved.
    pub fn clear(&self) {
        self.lock().ring.clear();
    }

    /// Current occupancy statistics.
    #[must_use]
    pub fn stats(&self) -> BufferStats {
        let inner = self.lock();
        BufferStats {
            lifetime_count: inner.lifetime_count,
            current_size: inner.ring.len(),
            capacity: self.capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-ring-operation; the ring
        // contains only complete records, so continuing is safe.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
