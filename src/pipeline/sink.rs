//! Append-only CSV output shared by every worker

use crate::error::Result;
use crate::types::Record;
use crate::utils::{csv_escape, csv_field, csv_line};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Destination for fetched records
#[async_trait::async_trait]
pub trait ResultSink: Send + Sync {
    /// Persist one record; errors are reported, never retried
    async fn append(&self, record: &Record) -> Result<()>;
}

#[derive(Debug, Default)]
struct SinkState {
    /// Set once the first record of this run has been written
    header_settled: bool,
    rows_written: u64,
}

/// CSV file sink with header-once semantics
///
/// Each append holds the lock across "check header flag, open in append
/// mode, write header and/or row, flush, close", so rows from concurrent
/// workers never interleave and writers serialize on disk I/O.
///
/// The header comes from the first record appended in this run and is only
/// written when the file is empty at that moment, so re-running against an
/// existing file appends rows without a second header. Later records are
/// written in their own field order; a record whose fields differ from the
/// header silently misaligns columns.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

impl CsvSink {
    /// Create a sink for `path`; nothing is opened until the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(SinkState::default()),
        }
    }

    /// Output file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended by this sink so far
    pub async fn rows_written(&self) -> u64 {
        self.state.lock().await.rows_written
    }
}

#[async_trait::async_trait]
impl ResultSink for CsvSink {
    async fn append(&self, record: &Record) -> Result<()> {
        let mut state = self.state.lock().await;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut buf = String::new();
        if !state.header_settled && file.metadata().await?.len() == 0 {
            buf.push_str(&csv_line(record.field_names().map(csv_escape)));
        }
        buf.push_str(&csv_line(record.values().map(csv_field)));

        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        drop(file);

        state.header_settled = true;
        state.rows_written += 1;
        Ok(())
    }
}
