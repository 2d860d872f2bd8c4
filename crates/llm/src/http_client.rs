//! HTTP Client Factory
//!
//! One place to build the reqwest client shared by a backend instance.
//! Only a connect timeout is set here; the per-request wall-clock ceiling is
//! the worker's watchdog, not a reqwest timeout, so that an abandoned call
//! never tears down the client.

use std::time::Duration;

/// Build a `reqwest::Client` for backend calls.
pub fn build_http_client(connect_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .expect("failed to build reqwest client")
}
