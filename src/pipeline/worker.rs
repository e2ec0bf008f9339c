//! Fixed-size pool of workers draining the shared queue
//!
//! Each worker loops: dequeue, fetch, append. Failures are logged, counted and
//! broadcast, then the worker moves on to the next instrument. A worker stops
//! only once it sees an empty queue; the pool returns after every worker has
//! stopped.

use super::client::RecordFetcher;
use super::queue::WorkQueue;
use super::sink::ResultSink;
use crate::types::{Event, FetchOutcome, InstrumentName, RunCounters, RunSummary};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Collaborators shared by all workers of one run
pub struct WorkerPoolParams {
    /// Pre-populated work queue
    pub queue: Arc<WorkQueue>,
    /// Where successful records go
    pub sink: Arc<dyn ResultSink>,
    /// Per-instrument fetcher
    pub fetcher: Arc<dyn RecordFetcher>,
    /// Event broadcast (lagging or absent receivers are fine)
    pub event_tx: broadcast::Sender<Event>,
}

struct WorkerShared {
    queue: Arc<WorkQueue>,
    sink: Arc<dyn ResultSink>,
    fetcher: Arc<dyn RecordFetcher>,
    event_tx: broadcast::Sender<Event>,
    counters: RunCounters,
}

impl WorkerShared {
    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

/// Pool of `worker_count` concurrent workers
pub struct WorkerPool {
    worker_count: usize,
    shared: Arc<WorkerShared>,
}

impl WorkerPool {
    /// Create a pool; `worker_count` is clamped to at least one
    pub fn new(worker_count: usize, params: WorkerPoolParams) -> Self {
        Self {
            worker_count: worker_count.max(1),
            shared: Arc::new(WorkerShared {
                queue: params.queue,
                sink: params.sink,
                fetcher: params.fetcher,
                event_tx: params.event_tx,
                counters: RunCounters::default(),
            }),
        }
    }

    /// Number of workers this pool spawns
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Spawn the workers and wait for all of them to finish
    ///
    /// Never fails: per-item errors stay inside the worker that hit them. A
    /// panicking worker is logged and, while names remain, replaced.
    pub async fn run(self) -> RunSummary {
        let started_at = Utc::now();
        let mut workers = JoinSet::new();

        for id in 0..self.worker_count {
            self.spawn_worker(&mut workers, id);
        }

        let mut next_id = self.worker_count;
        while let Some(joined) = workers.join_next().await {
            let Err(e) = joined else {
                continue;
            };
            tracing::error!(error = %e, "Worker stopped abnormally");

            // Keep the pool at strength while names remain
            if e.is_panic() && !self.shared.queue.is_empty() {
                tracing::info!(worker = next_id, "Spawning replacement worker");
                self.spawn_worker(&mut workers, next_id);
                next_id += 1;
            }
        }

        self.shared.counters.summary(started_at)
    }

    fn spawn_worker(&self, workers: &mut JoinSet<()>, id: usize) {
        let shared = Arc::clone(&self.shared);
        workers.spawn(worker_loop(id, shared).instrument(tracing::info_span!("worker", id)));
    }
}

async fn worker_loop(id: usize, shared: Arc<WorkerShared>) {
    tracing::debug!("Worker started");

    while !shared.queue.is_empty() {
        // Another worker may have claimed the last items since the check
        let Some(item) = shared.queue.dequeue() else {
            break;
        };
        shared.counters.record_dispatched();
        process_instrument(&shared, item.name()).await;
    }

    tracing::debug!("Worker finished");
    shared.emit(Event::WorkerFinished { worker: id });
}

async fn process_instrument(shared: &WorkerShared, instrument: &InstrumentName) {
    let record = match shared.fetcher.fetch(instrument).await {
        Ok(FetchOutcome::Fetched(record)) => record,
        Ok(FetchOutcome::Empty) => {
            tracing::info!(instrument = %instrument, "No data returned");
            shared.counters.record_empty();
            shared.emit(Event::RecordEmpty {
                instrument: instrument.clone(),
            });
            return;
        }
        Err(e) => {
            tracing::error!(instrument = %instrument, error = %e, "Error fetching data");
            shared.counters.record_fetch_failed();
            shared.emit(Event::FetchFailed {
                instrument: instrument.clone(),
                error: e.to_string(),
            });
            return;
        }
    };

    match shared.sink.append(&record).await {
        Ok(()) => {
            tracing::info!(instrument = %instrument, "Fetched and saved data");
            shared.counters.record_saved();
            shared.emit(Event::RecordSaved {
                instrument: instrument.clone(),
            });
        }
        Err(e) => {
            tracing::error!(instrument = %instrument, error = %e, "Error saving data");
            shared.counters.record_write_failed();
            shared.emit(Event::WriteFailed {
                instrument: instrument.clone(),
                error: e.to_string(),
            });
        }
    }
}
