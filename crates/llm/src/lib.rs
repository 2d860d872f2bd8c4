//! Redpen LLM
//!
//! The backend-facing half of the engine: builds wire requests for whichever
//! JSON dialect the configured backend speaks, performs the HTTP exchange
//! with bounded retries, parses the two possible response shapes, and cleans
//! the model output into paragraph-safe text.
//!
//! ## Module Organization
//!
//! - `protocol` - per-dialect request body construction
//! - `response` - non-streaming and line-delimited response parsing
//! - `normalize` - model-output cleanup pipeline
//! - `backend` - the `AiBackend` trait and its HTTP implementation
//! - `http_client` - reqwest client factory

pub mod backend;
pub mod http_client;
pub mod normalize;
pub mod protocol;
pub mod response;

// Re-export main types
pub use backend::{AiBackend, HttpBackend};
pub use http_client::build_http_client;
pub use normalize::normalize_output;
pub use protocol::build_request;
pub use response::parse_response;
