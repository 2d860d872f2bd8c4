//! Redpen Core
//!
//! Foundational types, traits, and error taxonomy for the redpen workspace.
//! This crate has zero dependencies on application-level code (HTTP client,
//! queues, host editor integration).
//!
//! ## Module Organization
//!
//! - `error` - Error taxonomy (`AiError`, `AiResult`, `StoreError`)
//! - `request` - AI work units (`RequestCategory`, `RequestEntry`)
//! - `document` - Document-side types and the `ParagraphStore` trait
//! - `flags` - Per-category feature switches (`FeatureFlags`, `AtomicFlags`)
//! - `config` - Backend configuration (`BackendConfig`, `Dialect`, `RetryPolicy`)
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror/url** - keeps build times minimal
//! 2. **Trait-based seams** - the host editor and the HTTP layer plug in behind traits
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod config;
pub mod document;
pub mod error;
pub mod flags;
pub mod request;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{AiError, AiResult, StoreError};

// ── Request Types ──────────────────────────────────────────────────────
pub use request::{RequestCategory, RequestEntry, UNSET_REQUEST_ID};

// ── Document Types ─────────────────────────────────────────────────────
pub use document::{DocId, InMemoryStore, ParagraphKind, ParagraphRef, ParagraphStore};

// ── Feature Flags ──────────────────────────────────────────────────────
pub use flags::{AtomicFlags, FeatureFlags};

// ── Backend Configuration ──────────────────────────────────────────────
pub use config::{BackendConfig, Dialect, RetryPolicy};
