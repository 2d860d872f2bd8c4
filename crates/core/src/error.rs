//! Error Taxonomy
//!
//! Defines the failure classes used across the redpen workspace. The class a
//! failure falls into decides how it is handled downstream: transient network
//! failures are retried, configuration failures and unreachable backends trip
//! the circuit breaker, protocol and backend-reported failures surface to the
//! caller as an empty result without disabling anything.

use thiserror::Error;

/// Errors raised while a paragraph store (the host document) is queried.
///
/// The batch planner propagates these unchanged; the caller treats the
/// affected paragraph as unbatchable and skips it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A paragraph index outside the document
    #[error("paragraph {index} is out of bounds")]
    OutOfBounds { index: usize },

    /// The document was closed while we were still holding a reference to it
    #[error("document is disposed")]
    Disposed,

    /// Any other host-side access failure
    #[error("store access failed: {message}")]
    Access { message: String },
}

impl StoreError {
    /// Create a generic access error
    pub fn access(msg: impl Into<String>) -> Self {
        Self::Access {
            message: msg.into(),
        }
    }
}

/// Error type for the AI request pipeline.
#[derive(Error, Debug)]
pub enum AiError {
    /// Connection refused/reset. Retried up to the configured bound; once the
    /// bound is exhausted the failure is reported as `BackendUnreachable`.
    #[error("network error: {message}")]
    TransientNetwork { message: String },

    /// The configured backend URL does not parse. Fatal, never retried.
    #[error("malformed backend URL: {url}")]
    MalformedConfiguration { url: String },

    /// The backend answered, but not in any shape we understand
    #[error("unexpected response from backend: {message}")]
    BackendProtocol { message: String },

    /// The backend answered with an explicit `error` field in the body
    #[error("backend reported an error: {message}")]
    BackendReported { message: String },

    /// HTTP 404 or transient retries exhausted
    #[error("backend unreachable: {message}")]
    BackendUnreachable { message: String },

    /// The watchdog gave up waiting on a single request
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Local file I/O failed (e.g. writing synthesized audio)
    #[error("file I/O failed: {message}")]
    Io { message: String },

    /// The host document could not be read
    #[error("paragraph store access failed: {0}")]
    StoreAccess(#[from] StoreError),
}

/// Result type alias for the AI request pipeline
pub type AiResult<T> = Result<T, AiError>;

impl AiError {
    /// Create a transient network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::TransientNetwork {
            message: msg.into(),
        }
    }

    /// Create a malformed-configuration error for the given URL
    pub fn malformed_url(url: impl Into<String>) -> Self {
        Self::MalformedConfiguration { url: url.into() }
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::BackendProtocol {
            message: msg.into(),
        }
    }

    /// Create a backend-reported error
    pub fn reported(msg: impl Into<String>) -> Self {
        Self::BackendReported {
            message: msg.into(),
        }
    }

    /// Create an unreachable-backend error
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::BackendUnreachable {
            message: msg.into(),
        }
    }

    /// Create a file I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io {
            message: msg.into(),
        }
    }

    /// Whether this failure must disable the whole request category.
    ///
    /// Only configuration failures and an unreachable backend do; a single
    /// malformed response or an error the backend itself reported leave the
    /// category enabled.
    pub fn trips_breaker(&self) -> bool {
        matches!(
            self,
            AiError::MalformedConfiguration { .. } | AiError::BackendUnreachable { .. }
        )
    }
}

impl From<AiError> for String {
    fn from(err: AiError) -> String {
        err.to_string()
    }
}
