//! Integration Tests Module
//!
//! Cross-crate tests for the redpen engine: protocol round-trips across all
//! four backend dialects, worker single-flight behavior under concurrent
//! submission, circuit breaker semantics, and the engine facade end to end.

mod support;

// Build/parse round-trips for every dialect
mod protocol_roundtrip_test;

// Request queue worker: single-flight, ordering, watchdog
mod worker_test;

// Circuit breaker: category disable, check queue discard
mod breaker_test;
