//! Worker pool and orchestration tests with scripted collaborators

use super::*;
use crate::error::Error;
use crate::types::{FetchOutcome, Record};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;


/// What the scripted fetcher answers for one instrument
#[derive(Clone)]
enum Scripted {
    Record(Value),
    Empty,
    Fail,
    Panic,
}

/// Fetcher answering from a script and recording every call
struct ScriptedFetcher {
    script: HashMap<String, Scripted>,
    fallback: Scripted,
    delay: Duration,
    calls: Mutex<Vec<InstrumentName>>,
}

impl ScriptedFetcher {
    fn new(fallback: Scripted) -> Self {
        Self {
            script: HashMap::new(),
            fallback,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with(mut self, instrument: &str, answer: Scripted) -> Self {
        self.script.insert(instrument.to_string(), answer);
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> Vec<InstrumentName> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RecordFetcher for ScriptedFetcher {
    async fn fetch(&self, instrument: &InstrumentName) -> Result<FetchOutcome> {
        self.calls.lock().unwrap().push(instrument.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let answer = self
            .script
            .get(instrument.as_str())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        match answer {
            Scripted::Record(value) => Ok(FetchOutcome::Fetched(record(value))),
            Scripted::Empty => Ok(FetchOutcome::Empty),
            Scripted::Fail => Err(Error::HttpStatus {
                url: format!("http://test/get_order_book?instrument_name={instrument}"),
                status: 502,
            }),
            Scripted::Panic => panic!("scripted panic for {instrument}"),
        }
    }
}

/// Sink keeping records in memory
#[derive(Default)]
struct MemorySink {
    rows: Mutex<Vec<Record>>,
}

impl MemorySink {
    fn instruments(&self) -> Vec<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.get("instrument_name").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait::async_trait]
impl ResultSink for MemorySink {
    async fn append(&self, record: &Record) -> Result<()> {
        self.rows.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Sink whose every write fails
struct FailingSink;

#[async_trait::async_trait]
impl ResultSink for FailingSink {
    async fn append(&self, _record: &Record) -> Result<()> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => Record::from_map(map),
        other => panic!("expected object, got {other}"),
    }
}

fn names<I, S>(items: I) -> Vec<InstrumentName>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(InstrumentName::new).collect()
}

fn event_channel() -> broadcast::Sender<Event> {
    broadcast::channel(10_000).0
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
