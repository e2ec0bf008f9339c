//! Mock Deribit server and config helpers

use deribit_harvest::Config;
use deribit_harvest::config::{ApiConfig, LoggingConfig, OutputConfig, PipelineConfig};
use serde_json::Value;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock serves the catalogue on
pub const CATALOGUE_PATH: &str = "/api/v2/public/get_instruments";
/// Path the mock serves order books on
pub const ORDER_BOOK_PATH: &str = "/api/v2/public/get_order_book";

/// Config pointing both endpoints at `server` and every file into `dir`
pub fn config_for(server: &MockServer, dir: &Path, worker_count: usize) -> Config {
    Config {
        api: ApiConfig {
            catalogue_url: format!("{}{}", server.uri(), CATALOGUE_PATH),
            order_book_url: format!("{}{}", server.uri(), ORDER_BOOK_PATH),
            ..Default::default()
        },
        pipeline: PipelineConfig {
            worker_count,
            ..Default::default()
        },
        output: OutputConfig {
            instrument_list_path: dir.join("instrument_names.csv"),
            record_path: dir.join("instrument_data.csv"),
        },
        logging: LoggingConfig {
            log_file: Some(dir.join("runtime.log")),
            filter: "info".to_string(),
            console: false,
        },
    }
}

/// Serve `body` for the catalogue
pub async fn mount_catalogue(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(CATALOGUE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve `response` for one instrument's order book, expecting `calls` hits
pub async fn mount_order_book(
    server: &MockServer,
    instrument: &str,
    response: ResponseTemplate,
    calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(ORDER_BOOK_PATH))
        .and(query_param("instrument_name", instrument))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

/// Read a file as lines (CRLF tolerant); a missing file reads as no lines
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
