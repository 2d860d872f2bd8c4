//! Backend Configuration
//!
//! One backend per worker instance: base URL, API key, model name, and the
//! wire dialect derived once from the URL path. Retry and watchdog settings
//! ride along so hosts can load everything from a single settings blob.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{AiError, AiResult};

/// The wire-protocol variant a backend speaks, inferred from its URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Legacy instruction/input edit endpoint (`…/edits`)
    Edits,
    /// Prompt completion endpoint (`…/completions`, outside a chat path)
    Completions,
    /// Chat messages endpoint (`…/chat`, `…/chat/completions`); the default
    #[default]
    Chat,
    /// Ollama-style generate endpoint (`…/generate`)
    Generate,
}

impl Dialect {
    /// Derive the dialect from a backend URL's path suffix.
    ///
    /// `…/chat/completions` must win over the bare `…/completions` suffix,
    /// so the chat checks come first. Anything unrecognized is Chat.
    pub fn from_url(url: &str) -> Self {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .trim_end_matches('/');
        if path.ends_with("/chat/completions") || path.ends_with("/chat") {
            Dialect::Chat
        } else if path.ends_with("/edits") {
            Dialect::Edits
        } else if path.ends_with("/completions") {
            Dialect::Completions
        } else if path.ends_with("/generate") {
            Dialect::Generate
        } else {
            Dialect::Chat
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Edits => write!(f, "edits"),
            Dialect::Completions => write!(f, "completions"),
            Dialect::Chat => write!(f, "chat"),
            Dialect::Generate => write!(f, "generate"),
        }
    }
}

/// Bounded-retry settings for transient network failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts for one request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after that
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before retrying after the given 1-based attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(6);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// Resolved backend configuration, read-only for the lifetime of a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Derived from `base_url` at construction; serde falls back to Chat
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Wall-clock ceiling for one request, watchdog-enforced by the worker
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,
}

fn default_watchdog_secs() -> u64 {
    10
}

impl BackendConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        let dialect = Dialect::from_url(&base_url);
        Self {
            base_url,
            api_key: api_key.into(),
            model: model.into(),
            dialect,
            retry: RetryPolicy::default(),
            watchdog_secs: default_watchdog_secs(),
        }
    }

    /// Check that the configured URL actually parses.
    ///
    /// Run before the first request; a failure here is fatal and trips the
    /// breaker without any retry.
    pub fn validate(&self) -> AiResult<()> {
        Url::parse(&self.base_url)
            .map(|_| ())
            .map_err(|_| AiError::malformed_url(&self.base_url))
    }

    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }
}
