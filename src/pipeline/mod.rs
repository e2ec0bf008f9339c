//! Concurrent fetch-and-persist pipeline
//!
//! The [`Harvester`] ties the pieces together:
//!
//! 1. [`CatalogueClient`] lists instrument names (empty on failure)
//! 2. the list is saved, one name per line
//! 3. a [`WorkQueue`] is filled with the names
//! 4. a [`WorkerPool`] of `worker_count` workers drains it, calling the
//!    [`RecordFetcher`] once per name and appending hits to the [`CsvSink`]
//! 5. `run` returns once every worker has seen the queue empty

use crate::catalogue::{CatalogueClient, save_instrument_list};
use crate::config::Config;
use crate::error::Result;
use crate::types::{Event, InstrumentName, RunSummary};
use std::sync::Arc;
use tokio::sync::broadcast;

/// HTTP fetch client for per-instrument records
pub mod client;
/// Shared work queue
pub mod queue;
/// CSV result sink
pub mod sink;
/// Worker pool
pub mod worker;

pub use client::{HttpRecordFetcher, RecordFetcher, http_client};
pub use queue::{WorkItem, WorkQueue};
pub use sink::{CsvSink, ResultSink};
pub use worker::{WorkerPool, WorkerPoolParams};

/// Orchestrates one harvest run
pub struct Harvester {
    config: Arc<Config>,
    catalogue: CatalogueClient,
    fetcher: Arc<dyn RecordFetcher>,
    event_tx: broadcast::Sender<Event>,
}

impl Harvester {
    /// Create a harvester talking to the endpoints in `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = http_client(&config.api)?;
        let fetcher = HttpRecordFetcher::new(client.clone(), &config.api, &config.pipeline)?;
        Self::build(config, client, Arc::new(fetcher))
    }

    /// Create a harvester with a custom per-instrument fetcher
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn RecordFetcher>) -> Result<Self> {
        config.validate()?;
        let client = http_client(&config.api)?;
        Self::build(config, client, fetcher)
    }

    fn build(config: Config, client: reqwest::Client, fetcher: Arc<dyn RecordFetcher>) -> Result<Self> {
        let catalogue = CatalogueClient::new(client, &config.api, &config.pipeline)?;
        let (event_tx, _rx) = broadcast::channel(1000);
        Ok(Self {
            config: Arc::new(config),
            catalogue,
            fetcher,
            event_tx,
        })
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full run: catalogue, instrument list file, then per-instrument data
    pub async fn run(&self) -> RunSummary {
        let names = self.catalogue.fetch_instruments().await;
        self.event_tx
            .send(Event::CatalogueFetched { count: names.len() })
            .ok();

        if let Err(e) = save_instrument_list(&self.config.output.instrument_list_path, &names).await
        {
            tracing::error!(
                path = %self.config.output.instrument_list_path.display(),
                error = %e,
                "Error saving instrument names"
            );
        }

        self.fetch_instrument_data(names).await
    }

    /// Fetch a record for every name and append hits to the record file
    ///
    /// Blocks until the queue is drained and every worker has stopped.
    pub async fn fetch_instrument_data(&self, names: Vec<InstrumentName>) -> RunSummary {
        let sink = Arc::new(CsvSink::new(self.config.output.record_path.clone()));
        fetch_instrument_data(
            names,
            sink,
            Arc::clone(&self.fetcher),
            self.config.pipeline.worker_count,
            self.event_tx.clone(),
        )
        .await
    }
}

/// Fill a fresh queue with `names` and drain it with `worker_count` workers
pub async fn fetch_instrument_data(
    names: Vec<InstrumentName>,
    sink: Arc<dyn ResultSink>,
    fetcher: Arc<dyn RecordFetcher>,
    worker_count: usize,
    event_tx: broadcast::Sender<Event>,
) -> RunSummary {
    tracing::info!(
        instruments = names.len(),
        workers = worker_count,
        "Fetching data for each instrument..."
    );

    let queue = Arc::new(WorkQueue::new());
    queue.extend(names);

    let pool = WorkerPool::new(
        worker_count,
        WorkerPoolParams {
            queue,
            sink,
            fetcher,
            event_tx: event_tx.clone(),
        },
    );
    let summary = pool.run().await;

    tracing::info!(
        saved = summary.saved,
        empty = summary.empty,
        fetch_failed = summary.fetch_failed,
        write_failed = summary.write_failed,
        "All instrument data fetched"
    );
    event_tx
        .send(Event::RunComplete {
            summary: summary.clone(),
        })
        .ok();

    summary
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
