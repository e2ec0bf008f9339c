//! Core types for deribit-harvest

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Name of a single instrument (e.g. `BTC-27DEC24-100000-C`)
///
/// Produced by the catalogue fetch and consumed by exactly one worker.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentName(pub String);

impl InstrumentName {
    /// Create a new InstrumentName
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for InstrumentName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for InstrumentName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for InstrumentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstrumentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fetched record: field name to value, in the order the API returned them
///
/// The shape is not known ahead of time. The first record appended during a
/// run decides the header of the output file; later records are written in
/// their own field order without being checked against it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an already-ordered JSON object
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Field names in insertion order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Field values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    /// Look up a single field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Result of a single successful request-response exchange
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// The API returned a non-empty `result` object
    Fetched(Record),
    /// The API answered but `result` was absent, null or empty
    Empty,
}

/// Event emitted while a harvest run is in progress
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Catalogue fetched and the instrument list saved
    CatalogueFetched {
        /// Number of instruments in the catalogue
        count: usize,
    },

    /// A record was appended to the output file
    RecordSaved {
        /// Instrument the record belongs to
        instrument: InstrumentName,
    },

    /// The API answered with an empty result for this instrument
    RecordEmpty {
        /// Instrument with no data
        instrument: InstrumentName,
    },

    /// The request for this instrument failed
    FetchFailed {
        /// Instrument that failed
        instrument: InstrumentName,
        /// Error message
        error: String,
    },

    /// The record was fetched but could not be written
    WriteFailed {
        /// Instrument whose record was dropped
        instrument: InstrumentName,
        /// Error message
        error: String,
    },

    /// A worker observed an empty queue and stopped
    WorkerFinished {
        /// Worker index (0-based)
        worker: usize,
    },

    /// Every worker has finished
    RunComplete {
        /// Counters for the run
        summary: RunSummary,
    },
}

/// Counters describing one pass of the worker pool
///
/// Purely diagnostic: the output file is the durable result, and a run with
/// failures still completes normally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Instruments handed to workers
    pub dispatched: u64,
    /// Records appended to the output
    pub saved: u64,
    /// Instruments that returned an empty result
    pub empty: u64,
    /// Instruments whose request failed
    pub fetch_failed: u64,
    /// Records fetched but dropped because the write failed
    pub write_failed: u64,
    /// When the pool started
    pub started_at: DateTime<Utc>,
    /// When the last worker finished
    pub finished_at: DateTime<Utc>,
}

/// Lock-free counters shared by all workers of a run
#[derive(Debug, Default)]
pub(crate) struct RunCounters {
    dispatched: AtomicU64,
    saved: AtomicU64,
    empty: AtomicU64,
    fetch_failed: AtomicU64,
    write_failed: AtomicU64,
}

impl RunCounters {
    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_saved(&self) {
        self.saved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_empty(&self) {
        self.empty.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_failed(&self) {
        self.fetch_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failed(&self) {
        self.write_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn summary(&self, started_at: DateTime<Utc>) -> RunSummary {
        RunSummary {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            fetch_failed: self.fetch_failed.load(Ordering::Relaxed),
            write_failed: self.write_failed.load(Ordering::Relaxed),
            started_at,
            finished_at: Utc::now(),
        }
    }
}
