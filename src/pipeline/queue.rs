//! Shared FIFO of instruments waiting to be fetched

use crate::types::InstrumentName;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thread-safe FIFO of pending instruments plus an in-flight count
///
/// `dequeue` pops the head and bumps the in-flight count under one lock, so
/// two workers can never claim the same entry. The count drops again when the
/// returned [`WorkItem`] is dropped.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: Mutex<VecDeque<InstrumentName>>,
    in_flight: Arc<AtomicUsize>,
}

impl WorkQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one instrument to the tail
    pub fn enqueue(&self, name: InstrumentName) {
        self.lock().push_back(name);
    }

    /// Append many instruments in order (duplicates are kept)
    pub fn extend<I>(&self, names: I)
    where
        I: IntoIterator<Item = InstrumentName>,
    {
        self.lock().extend(names);
    }

    /// Pop the head, or `None` when nothing is pending; never waits
    pub fn dequeue(&self) -> Option<WorkItem> {
        let mut pending = self.lock();
        let name = pending.pop_front()?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Some(WorkItem {
            name,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Snapshot: nothing pending right now
    ///
    /// Not authoritative; another worker may empty the queue right after this
    /// returns `false`.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of pending instruments
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Number of dequeued items not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Nothing pending and nothing in flight
    pub fn is_drained(&self) -> bool {
        let pending = self.lock();
        pending.is_empty() && self.in_flight.load(Ordering::SeqCst) == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<InstrumentName>> {
        // The critical sections cannot leave the deque half-updated
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An instrument claimed by a worker; completes when dropped
#[derive(Debug)]
pub struct WorkItem {
    name: InstrumentName,
    in_flight: Arc<AtomicUsize>,
}

impl WorkItem {
    /// The claimed instrument
    pub fn name(&self) -> &InstrumentName {
        &self.name
    }
}

impl Drop for WorkItem {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
