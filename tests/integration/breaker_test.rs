//! Circuit Breaker Integration Tests
//!
//! A backend that stays unreachable past the retry bound must flip the
//! category's feature flag, discard the owning check queue (text category),
//! notify observers, and unblock every waiter with an empty result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use redpen::{
    AiEngine, AtomicFlags, BreakerObserver, CheckQueueEntry, DocId, FeatureFlags, ParagraphRef,
    RequestCategory,
};

use crate::support::{ScriptedBackend, UnreachableBackend};

struct ClosingDialog(AtomicUsize);

impl BreakerObserver for ClosingDialog {
    fn on_category_disabled(&self, _category: RequestCategory) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn check_entry(doc: &str) -> CheckQueueEntry {
    CheckQueueEntry::new(
        DocId::from(doc),
        ParagraphRef::body(0),
        ParagraphRef::body(4),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_backend_trips_text_breaker() {
    crate::support::init_tracing();
    let flags = Arc::new(AtomicFlags::all_enabled());
    let engine = AiEngine::with_backend(
        UnreachableBackend::new(),
        flags.clone(),
        Duration::from_secs(10),
    );
    let dialog = Arc::new(ClosingDialog(AtomicUsize::new(0)));
    engine.breaker().add_observer(dialog.clone());
    engine.enqueue_check(check_entry("doc1"), false);

    let result = engine
        .submit_text_request("Correct this", "He go home.", 0.7, None, None, true, false)
        .await;

    assert_eq!(result, None);
    assert!(!flags.is_enabled(RequestCategory::Text));
    assert!(engine.check_queue().is_stopped());
    assert!(engine.check_queue().is_empty());
    assert_eq!(dialog.0.load(Ordering::SeqCst), 1);

    // Further submissions are refused without touching the backend again.
    let again = engine
        .submit_text_request("Correct this", "Still here.", 0.7, None, None, true, false)
        .await;
    assert_eq!(again, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_trip_unblocks_all_queued_waiters() {
    let flags = Arc::new(AtomicFlags::all_enabled());
    let engine = Arc::new(AiEngine::with_backend(
        UnreachableBackend::new(),
        flags,
        Duration::from_secs(10),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .submit_text_request("Correct", &format!("p{}", i), 0.7, None, None, true, false)
                .await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), None);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_image_trip_leaves_text_enabled() {
    let flags = Arc::new(AtomicFlags::all_enabled());
    let engine = AiEngine::with_backend(
        UnreachableBackend::new(),
        flags.clone(),
        Duration::from_secs(10),
    );
    engine.enqueue_check(check_entry("doc1"), false);

    let result = engine
        .submit_image_request("A cat", "", 512, 512, None, false)
        .await;

    assert_eq!(result, None);
    assert!(!flags.is_enabled(RequestCategory::Image));
    assert!(flags.is_enabled(RequestCategory::Text));
    // The check queue belongs to the text category and keeps its work.
    assert!(!engine.check_queue().is_stopped());
    assert_eq!(engine.check_queue().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_healthy_backend_never_trips() {
    let flags = Arc::new(AtomicFlags::all_enabled());
    let engine = AiEngine::with_backend(
        ScriptedBackend::answering("ok"),
        flags.clone(),
        Duration::from_secs(10),
    );

    let result = engine
        .submit_text_request("Correct", "fine", 0.7, None, None, false, false)
        .await;
    assert!(result.is_some());
    assert!(flags.is_enabled(RequestCategory::Text));
}
