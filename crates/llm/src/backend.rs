//! AI Backend
//!
//! `AiBackend` is the seam between the worker and the wire: one synchronous
//! exchange per call, retries included. Tests substitute a scripted fake;
//! production uses `HttpBackend` over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use redpen_core::{AiError, AiResult, BackendConfig, RequestCategory, RequestEntry};

use crate::http_client::build_http_client;
use crate::protocol::build_request;
use crate::response::parse_response;

/// One backend exchange per category. Implementations must be cheap to call
/// repeatedly; retry policy lives inside the implementation, never in the
/// worker above it.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Grammar/style rewrite; returns the raw extracted answer text.
    async fn perform_text(&self, entry: &RequestEntry) -> AiResult<String>;

    /// Image generation; returns the image URL.
    async fn perform_image(&self, entry: &RequestEntry) -> AiResult<String>;

    /// Speech synthesis; returns the raw audio bytes.
    async fn perform_speech(&self, entry: &RequestEntry) -> AiResult<Vec<u8>>;
}

/// HTTP implementation of `AiBackend` against the configured backend URL.
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Self {
        let client = build_http_client(Duration::from_secs(5));
        Self { config, client }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Cheap reachability probe: any HTTP answer counts as reachable.
    pub async fn health_check(&self) -> AiResult<()> {
        self.config.validate()?;
        self.client
            .get(&self.config.base_url)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| AiError::unreachable(e.to_string()))
    }

    /// Send one request, retrying transient connection failures up to the
    /// configured bound with doubling backoff. Non-200 answers are read from
    /// the error body and logged together with the request that caused them.
    async fn exchange(&self, entry: &RequestEntry) -> AiResult<Vec<u8>> {
        self.config.validate()?;
        let (url, body) = build_request(&self.config, entry);
        let retry = &self.config.retry;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(id = entry.id, category = %entry.category, attempt, url = %url, "sending backend request");

            let sent = self
                .client
                .post(&url)
                .header("Content-Type", "application/json")
                .header("Authorization", &self.config.api_key)
                .json(&body)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    if attempt < retry.max_attempts {
                        warn!(
                            id = entry.id,
                            attempt,
                            error = %e,
                            "backend connection failed, retrying"
                        );
                        tokio::time::sleep(retry.delay_after(attempt)).await;
                        continue;
                    }
                    warn!(id = entry.id, attempts = attempt, error = %e, "backend retries exhausted");
                    return Err(AiError::unreachable(format!(
                        "{} attempts failed: {}",
                        attempt, e
                    )));
                }
            };

            let status = response.status().as_u16();
            if status == 200 {
                return response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| AiError::network(e.to_string()));
            }

            let error_body = response.text().await.unwrap_or_default();
            warn!(
                id = entry.id,
                status,
                url = %url,
                request = %body,
                response = %error_body,
                "backend returned an error page"
            );
            return if status == 404 {
                Err(AiError::unreachable(format!("HTTP 404 at {}", url)))
            } else {
                Err(AiError::reported(format!("HTTP {}: {}", status, error_body)))
            };
        }
    }

    async fn exchange_text(&self, entry: &RequestEntry) -> AiResult<String> {
        let bytes = self.exchange(entry).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl AiBackend for HttpBackend {
    async fn perform_text(&self, entry: &RequestEntry) -> AiResult<String> {
        let raw = self.exchange_text(entry).await?;
        parse_response(RequestCategory::Text, self.config.dialect, &raw)
    }

    async fn perform_image(&self, entry: &RequestEntry) -> AiResult<String> {
        let raw = self.exchange_text(entry).await?;
        parse_response(RequestCategory::Image, self.config.dialect, &raw)
    }

    async fn perform_speech(&self, entry: &RequestEntry) -> AiResult<Vec<u8>> {
        self.exchange(entry).await
    }
}
