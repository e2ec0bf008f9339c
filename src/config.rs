//! Configuration types for deribit-harvest
//!
//! Every field has a serde default, so an empty JSON object (or no config file
//! at all) reproduces the stock behaviour: BTC options, 12 workers, a single
//! attempt per instrument and no request timeout.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote API endpoints and catalogue query parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Catalogue endpoint (default: Deribit history `get_instruments`)
    #[serde(default = "default_catalogue_url")]
    pub catalogue_url: String,

    /// Per-instrument endpoint (default: Deribit `get_order_book`)
    #[serde(default = "default_order_book_url")]
    pub order_book_url: String,

    /// Currency to list instruments for (default: "BTC")
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Instrument kind (default: "option")
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Include expired instruments (default: true)
    #[serde(default = "default_true")]
    pub expired: bool,

    /// Include old instruments (default: true)
    #[serde(default = "default_true")]
    pub include_old: bool,

    /// Maximum number of instruments the catalogue returns (default: 10000)
    #[serde(default = "default_count")]
    pub count: u32,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            catalogue_url: default_catalogue_url(),
            order_book_url: default_order_book_url(),
            currency: default_currency(),
            kind: default_kind(),
            expired: true,
            include_old: true,
            count: default_count(),
            user_agent: default_user_agent(),
        }
    }
}

/// Worker pool settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent workers (default: 12)
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Per-request timeout (default: none, a hung request blocks its worker)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// Retry policy for per-instrument fetches
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            request_timeout: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for transient fetch failures
///
/// The default makes exactly one attempt per instrument.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first (default: 0)
    #[serde(default)]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Output file locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Instrument list, truncated on every run (default: "instrument_names.csv")
    #[serde(default = "default_instrument_list_path")]
    pub instrument_list_path: PathBuf,

    /// Record output, opened in append mode (default: "instrument_data.csv")
    #[serde(default = "default_record_path")]
    pub record_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            instrument_list_path: default_instrument_list_path(),
            record_path: default_record_path(),
        }
    }
}

/// Log stream settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Append-only log file (default: "runtime.log", None = console only)
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,

    /// Filter directive used when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Also log to the console (default: true)
    #[serde(default = "default_true")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            filter: default_log_filter(),
            console: true,
        }
    }
}

/// Main configuration for a harvest run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Worker pool settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Output file locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Log stream settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load a configuration from a JSON file
    ///
    /// Missing keys fall back to their defaults. The result is validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.worker_count == 0 {
            return Err(Error::config(
                "pipeline.worker_count",
                "worker_count must be at least 1",
            ));
        }

        for (key, value) in [
            ("api.catalogue_url", &self.api.catalogue_url),
            ("api.order_book_url", &self.api.order_book_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::config(key, format!("invalid URL {:?}: {}", value, e)))?;
        }

        if self.api.currency.trim().is_empty() {
            return Err(Error::config("api.currency", "currency must not be empty"));
        }

        if self.pipeline.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "pipeline.retry.backoff_multiplier",
                "backoff_multiplier must be >= 1.0",
            ));
        }

        Ok(())
    }
}

fn default_catalogue_url() -> String {
    "https://history.deribit.com/api/v2/public/get_instruments".to_string()
}

fn default_order_book_url() -> String {
    "https://www.deribit.com/api/v2/public/get_order_book".to_string()
}

fn default_currency() -> String {
    "BTC".to_string()
}

fn default_kind() -> String {
    "option".to_string()
}

fn default_count() -> u32 {
    10_000
}

fn default_user_agent() -> String {
    concat!("deribit-harvest/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_worker_count() -> usize {
    12
}

fn default_true() -> bool {
    true
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_instrument_list_path() -> PathBuf {
    PathBuf::from("instrument_names.csv")
}

fn default_record_path() -> PathBuf {
    PathBuf::from("instrument_data.csv")
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("runtime.log"))
}

fn default_log_filter() -> String {
    "info".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
