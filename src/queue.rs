//! Request Queue & Worker
//!
//! All AI work funnels through one FIFO/priority queue drained by exactly
//! one background worker per queue instance. The worker is started lazily on
//! the first submission and terminates itself once the queue drains; callers
//! block on a per-request channel until their result is published.
//!
//! A wall-clock watchdog bounds every single request so that one stalled
//! HTTP exchange cannot wedge the queue; the abandoned call's eventual
//! response, if any, is discarded.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, warn};

use redpen_core::{
    AiError, AiResult, FeatureFlags, RequestCategory, RequestEntry, UNSET_REQUEST_ID,
};
use redpen_llm::{normalize_output, AiBackend};

use crate::breaker::CircuitBreaker;

/// Ids wrap back to 1 here; 0 stays reserved for "unset".
pub const MAX_REQUEST_ID: u64 = u32::MAX as u64;

struct QueueState {
    entries: VecDeque<RequestEntry>,
    /// Worker side of each request's result channel
    pending: HashMap<u64, oneshot::Sender<Option<String>>>,
    /// Caller side; removed by `await_result`, so the map never outlives
    /// its caller's interest
    slots: HashMap<u64, oneshot::Receiver<Option<String>>>,
}

/// FIFO/priority queue of heterogeneous AI requests with a single lazy
/// background worker.
pub struct RequestQueue {
    state: Mutex<QueueState>,
    next_id: AtomicU64,
    worker_active: AtomicBool,
    workers_spawned: AtomicU64,
    backend: Arc<dyn AiBackend>,
    flags: Arc<dyn FeatureFlags>,
    breaker: Arc<CircuitBreaker>,
    watchdog: Duration,
}

impl RequestQueue {
    pub fn new(
        backend: Arc<dyn AiBackend>,
        flags: Arc<dyn FeatureFlags>,
        breaker: Arc<CircuitBreaker>,
        watchdog: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                pending: HashMap::new(),
                slots: HashMap::new(),
            }),
            next_id: AtomicU64::new(0),
            worker_active: AtomicBool::new(false),
            workers_spawned: AtomicU64::new(0),
            backend,
            flags,
            breaker,
            watchdog,
        })
    }

    /// Queue an entry and make sure a worker is draining.
    ///
    /// Panics if the entry already carries an id: one outstanding id per
    /// entry instance, reuse is a programming error.
    pub fn submit(self: &Arc<Self>, mut entry: RequestEntry, priority: bool) -> u64 {
        assert_eq!(
            entry.id, UNSET_REQUEST_ID,
            "request entry was already submitted (id {})",
            entry.id
        );
        let id = self.allocate_id();
        entry.id = id;
        debug!(id, category = %entry.category, priority, "request queued");

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().expect("queue lock");
            state.pending.insert(id, tx);
            state.slots.insert(id, rx);
            if priority {
                state.entries.push_front(entry);
            } else {
                state.entries.push_back(entry);
            }
        }
        self.spawn_worker_if_idle();
        id
    }

    /// Block until the result for `id` is published, then take it.
    ///
    /// Returns `None` for a terminal failure, and also for an id that was
    /// never submitted or was already awaited.
    pub async fn await_result(&self, id: u64) -> Option<String> {
        let rx = {
            let mut state = self.state.lock().expect("queue lock");
            state.slots.remove(&id)
        };
        match rx {
            Some(rx) => rx.await.unwrap_or(None),
            None => None,
        }
    }

    /// Number of worker tasks started over this queue's lifetime.
    pub fn workers_spawned(&self) -> u64 {
        self.workers_spawned.load(Ordering::SeqCst)
    }

    /// Whether a worker task is currently draining the queue.
    pub fn worker_active(&self) -> bool {
        self.worker_active.load(Ordering::SeqCst)
    }

    pub fn queued_len(&self) -> usize {
        self.state.lock().expect("queue lock").entries.len()
    }

    fn allocate_id(&self) -> u64 {
        let prev = self
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(if n >= MAX_REQUEST_ID { 1 } else { n + 1 })
            })
            .expect("id update never fails");
        if prev >= MAX_REQUEST_ID {
            1
        } else {
            prev + 1
        }
    }

    fn spawn_worker_if_idle(self: &Arc<Self>) {
        if self
            .worker_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.workers_spawned.fetch_add(1, Ordering::SeqCst);
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.run_worker().await });
        }
    }

    async fn run_worker(self: Arc<Self>) {
        debug!("request worker started");
        loop {
            let entry = {
                let mut state = self.state.lock().expect("queue lock");
                state.entries.pop_front()
            };
            let Some(entry) = entry else {
                self.worker_active.store(false, Ordering::SeqCst);
                // A submit may have slipped in between the pop and the flag
                // store and seen the worker as still active; reclaim the
                // flag and keep draining if so.
                let refilled = !self.state.lock().expect("queue lock").entries.is_empty();
                if refilled
                    && self
                        .worker_active
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok()
                {
                    continue;
                }
                break;
            };

            let id = entry.id;
            let category = entry.category;

            if !self.flags.is_enabled(category) {
                debug!(id, %category, "category disabled, dropping request");
                self.publish(id, None);
                continue;
            }

            let outcome = match timeout(self.watchdog, self.dispatch(&entry)).await {
                Ok(result) => result,
                Err(_) => Err(AiError::Timeout {
                    seconds: self.watchdog.as_secs(),
                }),
            };

            match outcome {
                Ok(text) => self.publish(id, Some(text)),
                Err(e) => {
                    warn!(id, %category, error = %e, "request failed");
                    // Trip before publishing so a caller that unblocks on
                    // this failure already observes the category disabled.
                    if e.trips_breaker() {
                        self.breaker.trip(category);
                        self.fail_queued(category);
                    }
                    self.publish(id, None);
                }
            }
        }
        debug!("request worker drained, exiting");
    }

    /// Category-specific synchronous calls, in the worker's context.
    async fn dispatch(&self, entry: &RequestEntry) -> AiResult<String> {
        match entry.category {
            RequestCategory::Text => {
                let raw = self.backend.perform_text(entry).await?;
                Ok(normalize_output(
                    &raw,
                    &entry.text,
                    &entry.instruction,
                    entry.only_one_paragraph,
                ))
            }
            RequestCategory::Image => self.backend.perform_image(entry).await,
            RequestCategory::Speech => {
                let bytes = self.backend.perform_speech(entry).await?;
                let path = entry
                    .filename
                    .clone()
                    .ok_or_else(|| AiError::io("speech request without a target filename"))?;
                tokio::fs::write(&path, &bytes)
                    .await
                    .map_err(|e| AiError::io(format!("{}: {}", path.display(), e)))?;
                Ok(path.display().to_string())
            }
        }
    }

    fn publish(&self, id: u64, result: Option<String>) {
        let tx = {
            let mut state = self.state.lock().expect("queue lock");
            state.pending.remove(&id)
        };
        if let Some(tx) = tx {
            // The caller may have given up; a dropped receiver is fine.
            let _ = tx.send(result);
        }
    }

    /// Fail every queued entry of a category that was just disabled, so its
    /// waiters unblock with an empty result instead of hanging.
    fn fail_queued(&self, category: RequestCategory) {
        let dropped: Vec<u64> = {
            let mut state = self.state.lock().expect("queue lock");
            let mut dropped = Vec::new();
            state.entries.retain(|e| {
                if e.category == category {
                    dropped.push(e.id);
                    false
                } else {
                    true
                }
            });
            dropped
        };
        for id in dropped {
            self.publish(id, None);
        }
    }
}
