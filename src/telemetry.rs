//! Log stream setup
//!
//! The subscriber is built explicitly from [`LoggingConfig`] and installed
//! once at process start. Everything after that emits through `tracing`
//! macros; tests build their own [`Dispatch`] and scope it with
//! [`tracing::dispatcher::with_default`] instead of touching global state.

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;

/// Build a dispatcher that writes to the console and/or an append-only file
///
/// `RUST_LOG` takes precedence over `config.filter` when set.
pub fn build_dispatch(config: &LoggingConfig) -> Result<Dispatch> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| Error::Logging(format!("invalid filter {:?}: {}", config.filter, e)))?,
    };

    let console = config.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(true)
            .with_timer(ChronoLocal::rfc_3339())
    });

    let file = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    Error::Logging(format!("cannot open log file {}: {}", path.display(), e))
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(ChronoLocal::rfc_3339())
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file);

    Ok(Dispatch::new(subscriber))
}

/// Build the dispatcher and install it as the process-wide default
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let dispatch = build_dispatch(config)?;
    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|e| Error::Logging(format!("logging already initialised: {}", e)))
}
