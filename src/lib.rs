//! # deribit-harvest
//!
//! Concurrent harvester for Deribit option order books.
//!
//! One request lists every BTC option instrument (expired ones included); the
//! names are saved to a CSV file, then a fixed pool of workers fetches the
//! order book for each instrument and appends every non-empty result to a
//! second CSV file.
//!
//! ## Failure model
//!
//! Nothing that goes wrong with a single instrument stops the run. Request
//! failures, empty results and write errors are logged (and broadcast as
//! [`Event`]s); the run completes once the queue is drained. The output may
//! therefore hold fewer rows than there are instruments.
//!
//! ## Quick Start
//!
//! ```no_run
//! use deribit_harvest::{Config, Harvester, telemetry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     telemetry::init_logging(&config.logging)?;
//!
//!     let harvester = Harvester::new(config)?;
//!     let summary = harvester.run().await;
//!     println!("saved {} records", summary.saved);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Instrument catalogue fetch and instrument list file
pub mod catalogue;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Fetch-and-persist pipeline (queue, fetcher, sink, worker pool)
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
/// Log stream setup
pub mod telemetry;
/// Core types and events
pub mod types;
/// CSV encoding helpers
pub mod utils;

// Re-export commonly used types
pub use catalogue::{CatalogueClient, save_instrument_list};
pub use config::{ApiConfig, Config, LoggingConfig, OutputConfig, PipelineConfig, RetryConfig};
pub use error::{Error, Result};
pub use pipeline::{
    CsvSink, Harvester, HttpRecordFetcher, RecordFetcher, ResultSink, WorkQueue, WorkerPool,
    WorkerPoolParams, fetch_instrument_data,
};
pub use types::{Event, FetchOutcome, InstrumentName, Record, RunSummary};
