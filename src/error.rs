//! Error types for deribit-harvest
//!
//! Errors never escape a worker: the pool logs them and moves on. They still
//! carry enough context (URL, status, timeout) for the log line to be useful.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for deribit-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for deribit-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "worker_count")
        key: Option<String>,
    },

    /// I/O error (output files, log file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure (connect, read, decode)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote API answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body did not have the expected shape
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse {
        /// Requested URL
        url: String,
        /// What was wrong with the body
        reason: String,
    },

    /// Request exceeded the configured timeout
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Requested URL
        url: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// Logging could not be initialised
    #[error("logging error: {0}")]
    Logging(String),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// True for failures of the request-response exchange itself
    ///
    /// These are the "hard" per-item failures: the instrument is skipped and
    /// not represented in the output.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::HttpStatus { .. }
                | Error::MalformedResponse { .. }
                | Error::Timeout { .. }
        )
    }
}
