//! Per-instrument fetch client
//!
//! [`RecordFetcher`] is the seam the worker pool talks to. The production
//! implementation issues one GET per instrument against the order book
//! endpoint; tests plug in scripted fetchers instead.

use crate::config::{ApiConfig, PipelineConfig, RetryConfig};
use crate::error::{Error, Result};
use crate::retry::fetch_with_retry;
use crate::types::{FetchOutcome, InstrumentName, Record};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Abstraction over the per-instrument request, enabling testability
///
/// `Ok(FetchOutcome::Empty)` is a soft failure (nothing to record),
/// `Err(_)` a hard one. Either way the caller moves on to the next item.
#[async_trait::async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetch the record for a single instrument
    async fn fetch(&self, instrument: &InstrumentName) -> Result<FetchOutcome>;
}

/// Build the HTTP client shared by the catalogue and record fetchers
///
/// No client-wide timeout is set; per-request timeouts are opt-in.
pub fn http_client(api: &ApiConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(api.user_agent.clone())
        .build()
        .map_err(Error::Network)
}

/// GET `url` and decode the body as JSON
///
/// Non-2xx statuses and undecodable bodies are errors. When `timeout` is set
/// it bounds the whole exchange, body included.
pub(crate) async fn get_json(
    client: &reqwest::Client,
    url: &Url,
    timeout: Option<Duration>,
) -> Result<Value> {
    let exchange = exchange_json(client, url);

    match timeout {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .map_err(|_| Error::Timeout {
                url: url.to_string(),
                timeout: limit,
            })?,
        None => exchange.await,
    }
}

async fn exchange_json(client: &reqwest::Client, url: &Url) -> Result<Value> {
    let response = client.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;
    serde_json::from_slice::<Value>(&body).map_err(|e| Error::MalformedResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Production [`RecordFetcher`] backed by the order book endpoint
#[derive(Clone, Debug)]
pub struct HttpRecordFetcher {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Option<Duration>,
    retry: RetryConfig,
}

impl HttpRecordFetcher {
    /// Create a fetcher from the API and pipeline settings
    pub fn new(client: reqwest::Client, api: &ApiConfig, pipeline: &PipelineConfig) -> Result<Self> {
        let endpoint = Url::parse(&api.order_book_url).map_err(|e| {
            Error::config(
                "api.order_book_url",
                format!("invalid URL {:?}: {}", api.order_book_url, e),
            )
        })?;

        Ok(Self {
            client,
            endpoint,
            timeout: pipeline.request_timeout,
            retry: pipeline.retry.clone(),
        })
    }

    fn url_for(&self, instrument: &InstrumentName) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("instrument_name", instrument.as_str());
        url
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchOutcome> {
        let body = get_json(&self.client, url, self.timeout).await?;
        extract_result(url, body)
    }
}

#[async_trait::async_trait]
impl RecordFetcher for HttpRecordFetcher {
    async fn fetch(&self, instrument: &InstrumentName) -> Result<FetchOutcome> {
        let url = self.url_for(instrument);
        fetch_with_retry(&self.retry, || self.fetch_once(&url)).await
    }
}

/// Pull the `result` payload out of an API response
///
/// A missing, null or otherwise falsy payload is [`FetchOutcome::Empty`].
/// A non-empty payload that is not a flat object cannot become a row.
fn extract_result(url: &Url, mut body: Value) -> Result<FetchOutcome> {
    let payload = match body.get_mut("result") {
        Some(payload) => payload.take(),
        None => return Ok(FetchOutcome::Empty),
    };

    match payload {
        Value::Object(map) if map.is_empty() => Ok(FetchOutcome::Empty),
        Value::Object(map) => Ok(FetchOutcome::Fetched(Record::from_map(map))),
        Value::Null | Value::Bool(false) => Ok(FetchOutcome::Empty),
        Value::Array(items) if items.is_empty() => Ok(FetchOutcome::Empty),
        Value::String(s) if s.is_empty() => Ok(FetchOutcome::Empty),
        other => Err(Error::MalformedResponse {
            url: url.to_string(),
            reason: format!("expected an object in `result`, got {}", kind_of(&other)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
