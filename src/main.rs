//! Command-line entry point: `deribit-harvest [config.json]`
//!
//! Exits non-zero only when the configuration or the log stream cannot be set
//! up. Per-instrument failures are logged and do not affect the exit code.

use deribit_harvest::{Config, Harvester, telemetry};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match std::env::args_os().nth(1) {
        Some(path) => match Config::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("deribit-harvest: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    if let Err(e) = telemetry::init_logging(&config.logging) {
        eprintln!("deribit-harvest: {e}");
        return ExitCode::FAILURE;
    }

    let harvester = match Harvester::new(config) {
        Ok(harvester) => harvester,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start harvester");
            return ExitCode::FAILURE;
        }
    };

    let summary = harvester.run().await;
    tracing::info!(
        saved = summary.saved,
        elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds(),
        "Run finished"
    );

    ExitCode::SUCCESS
}
