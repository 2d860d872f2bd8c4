//! Redpen
//!
//! AI request orchestration engine for document writing assistance: decides
//! which paragraph spans need an AI call, serializes heterogeneous requests
//! (text rewrite, image generation, speech synthesis) through a single
//! background worker against one configurable HTTP backend, and disables a
//! request category after persistent failure.
//!
//! The host editor plugs in behind the traits in [`redpen_core`]
//! (`ParagraphStore`, `FeatureFlags`, `CheckSource`); the wire protocol
//! lives in [`redpen_llm`].
//!
//! ## Module Organization
//!
//! - `batch` - chapter-bounded paragraph chunking
//! - `queue` - the request queue and its single-flight worker
//! - `check_queue` - pending grammar/style checks per open document
//! - `breaker` - one-way per-category disable on persistent failure
//! - `engine` - the facade the host calls

pub mod batch;
pub mod breaker;
pub mod check_queue;
pub mod engine;
pub mod queue;

// ── Facade ─────────────────────────────────────────────────────────────
pub use engine::AiEngine;

// ── Components ─────────────────────────────────────────────────────────
pub use batch::{plan_range, BatchOptions, MIN_CHUNK_CHARS};
pub use breaker::{BreakerObserver, CircuitBreaker};
pub use check_queue::{CheckQueue, CheckQueueEntry, CheckRunner, CheckSource};
pub use queue::{RequestQueue, MAX_REQUEST_ID};

// ── Re-exports from the workspace crates ───────────────────────────────
pub use redpen_core::{
    AiError, AiResult, AtomicFlags, BackendConfig, Dialect, DocId, FeatureFlags, InMemoryStore,
    ParagraphKind, ParagraphRef, ParagraphStore, RequestCategory, RequestEntry, RetryPolicy,
    StoreError, UNSET_REQUEST_ID,
};
pub use redpen_llm::{build_request, normalize_output, parse_response, AiBackend, HttpBackend};
