//! Worker Tests
//!
//! The request queue must run exactly one worker at a time no matter how
//! many callers submit concurrently, serve priority submissions first, and
//! bound every request with the watchdog.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use redpen::{
    AiBackend, AiResult, AtomicFlags, CircuitBreaker, RequestEntry, RequestQueue,
};

use crate::support::ScriptedBackend;

fn queue_over(
    backend: Arc<dyn AiBackend>,
    watchdog: Duration,
) -> Arc<RequestQueue> {
    let flags = Arc::new(AtomicFlags::all_enabled());
    let breaker = CircuitBreaker::new(flags.clone());
    RequestQueue::new(backend, flags, breaker, watchdog)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_under_concurrent_submission() {
    crate::support::init_tracing();
    let backend = ScriptedBackend::answering("ok");
    let queue = queue_over(backend.clone(), Duration::from_secs(10));

    let mut handles = Vec::new();
    for i in 0..16 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            let id = queue.submit(RequestEntry::text("echo", format!("{}", i)), false);
            queue.await_result(id).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(result.as_deref(), Some(format!("ok #{}", i).as_str()));
    }

    // All 16 requests were served, strictly one at a time.
    assert_eq!(backend.calls.load(Ordering::SeqCst), 16);
    assert_eq!(backend.max_concurrent.load(Ordering::SeqCst), 1);
    assert!(!queue.worker_active());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_restarts_after_drain() {
    let backend = ScriptedBackend::answering("ok");
    let queue = queue_over(backend, Duration::from_secs(10));

    let id = queue.submit(RequestEntry::text("echo", "a"), false);
    assert!(queue.await_result(id).await.is_some());

    // Let the first worker exit, then submit again: a fresh worker starts.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!queue.worker_active());
    let id = queue.submit(RequestEntry::text("echo", "b"), false);
    assert!(queue.await_result(id).await.is_some());
    assert!(queue.workers_spawned() >= 2);
}

/// Backend that stalls forever on one marked entry.
struct StallingBackend;

#[async_trait]
impl AiBackend for StallingBackend {
    async fn perform_text(&self, entry: &RequestEntry) -> AiResult<String> {
        if entry.text == "stall" {
            // Far beyond any watchdog; the worker must abandon us.
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(format!("done {}", entry.text))
    }

    async fn perform_image(&self, _entry: &RequestEntry) -> AiResult<String> {
        unreachable!("text-only test backend")
    }

    async fn perform_speech(&self, _entry: &RequestEntry) -> AiResult<Vec<u8>> {
        unreachable!("text-only test backend")
    }
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_fails_stalled_request_and_queue_moves_on() {
    let queue = queue_over(Arc::new(StallingBackend), Duration::from_secs(10));

    let stalled = queue.submit(RequestEntry::text("echo", "stall"), false);
    let healthy = queue.submit(RequestEntry::text("echo", "next"), false);

    // The stalled request is reported failed once the watchdog fires...
    assert_eq!(queue.await_result(stalled).await, None);
    // ...and the queue is not wedged: the next entry still completes.
    assert_eq!(queue.await_result(healthy).await.as_deref(), Some("done next"));
}

/// Backend that records serve order and holds its first call until released,
/// so later submissions land while the queue is provably non-empty.
struct GatedBackend {
    gate: tokio::sync::Notify,
    order: std::sync::Mutex<Vec<String>>,
}

#[async_trait]
impl AiBackend for GatedBackend {
    async fn perform_text(&self, entry: &RequestEntry) -> AiResult<String> {
        let first = {
            let mut order = self.order.lock().unwrap();
            order.push(entry.text.clone());
            order.len() == 1
        };
        if first {
            self.gate.notified().await;
        }
        Ok(entry.text.clone())
    }

    async fn perform_image(&self, _entry: &RequestEntry) -> AiResult<String> {
        unreachable!("text-only test backend")
    }

    async fn perform_speech(&self, _entry: &RequestEntry) -> AiResult<Vec<u8>> {
        unreachable!("text-only test backend")
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_priority_submission_jumps_queue() {
    let backend = Arc::new(GatedBackend {
        gate: tokio::sync::Notify::new(),
        order: std::sync::Mutex::new(Vec::new()),
    });
    let queue = queue_over(backend.clone(), Duration::from_secs(10));

    // First entry occupies the worker; wait until it is actually running.
    let first = queue.submit(RequestEntry::text("echo", "first"), false);
    while backend.order.lock().unwrap().is_empty() {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    // Two normal entries, then a priority one: it must be served next.
    let normal = queue.submit(RequestEntry::text("echo", "normal"), false);
    let urgent = queue.submit(RequestEntry::text("echo", "urgent"), true);
    backend.gate.notify_one();

    for id in [first, normal, urgent] {
        assert!(queue.await_result(id).await.is_some());
    }
    let order = backend.order.lock().unwrap().clone();
    assert_eq!(order, vec!["first", "urgent", "normal"]);
}
