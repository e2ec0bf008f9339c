//! Instrument catalogue: one request for the list of names, saved to disk
//!
//! A failed catalogue request is not fatal. It is logged and yields an empty
//! list, so the rest of the run becomes a no-op.

use crate::config::{ApiConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::pipeline::client::get_json;
use crate::types::InstrumentName;
use crate::utils::{csv_escape, csv_line};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct CatalogueResponse {
    #[serde(default)]
    result: Vec<CatalogueEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogueEntry {
    instrument_name: Option<String>,
}

/// Client for the instrument catalogue endpoint
#[derive(Clone, Debug)]
pub struct CatalogueClient {
    client: reqwest::Client,
    url: Url,
    timeout: Option<Duration>,
}

impl CatalogueClient {
    /// Create a client; the query string is fixed from `api`
    pub fn new(client: reqwest::Client, api: &ApiConfig, pipeline: &PipelineConfig) -> Result<Self> {
        let count = api.count.to_string();
        let url = Url::parse_with_params(
            &api.catalogue_url,
            &[
                ("currency", api.currency.as_str()),
                ("kind", api.kind.as_str()),
                ("expired", bool_param(api.expired)),
                ("include_old", bool_param(api.include_old)),
                ("count", count.as_str()),
            ],
        )
        .map_err(|e| {
            Error::config(
                "api.catalogue_url",
                format!("invalid URL {:?}: {}", api.catalogue_url, e),
            )
        })?;

        Ok(Self {
            client,
            url,
            timeout: pipeline.request_timeout,
        })
    }

    /// Full request URL, query included
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch every instrument name, or an empty list if the request fails
    pub async fn fetch_instruments(&self) -> Vec<InstrumentName> {
        tracing::info!("Fetching instrument names...");
        match self.try_fetch_instruments().await {
            Ok(names) => {
                tracing::info!(count = names.len(), "Fetched instrument names");
                names
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching instruments");
                Vec::new()
            }
        }
    }

    /// Fetch every instrument name, surfacing the failure
    pub async fn try_fetch_instruments(&self) -> Result<Vec<InstrumentName>> {
        let body = get_json(&self.client, &self.url, self.timeout).await?;
        let response: CatalogueResponse =
            serde_json::from_value(body).map_err(|e| Error::MalformedResponse {
                url: self.url.to_string(),
                reason: e.to_string(),
            })?;

        let total = response.result.len();
        let names: Vec<InstrumentName> = response
            .result
            .into_iter()
            .filter_map(|entry| entry.instrument_name)
            .map(InstrumentName::from)
            .collect();

        if names.len() < total {
            tracing::warn!(
                skipped = total - names.len(),
                "Catalogue entries without instrument_name were skipped"
            );
        }

        Ok(names)
    }
}

fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Write one instrument name per line, replacing any previous list
pub async fn save_instrument_list(path: &Path, names: &[InstrumentName]) -> Result<()> {
    tracing::info!(path = %path.display(), "Saving instrument names...");

    let mut contents = String::new();
    for name in names {
        contents.push_str(&csv_line([csv_escape(name.as_str())]));
    }
    tokio::fs::write(path, contents).await?;

    tracing::info!(count = names.len(), "Instrument names saved");
    Ok(())
}
