//! Check Queue
//!
//! Pending grammar/style checks, one priority list per process plus a
//! round-robin scan over the open documents that can supply more work. A
//! misbehaving document must never stall the queue: source errors are
//! logged and treated as "nothing pending there".

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, warn};

use redpen_core::{AiResult, DocId, ParagraphRef, StoreError};

/// One pending "check this paragraph range" item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckQueueEntry {
    pub doc_id: DocId,
    pub range_start: ParagraphRef,
    pub range_end: ParagraphRef,
    /// Which result cache this entry feeds
    pub cache_slot: usize,
    /// Which check pass this entry belongs to
    pub check_index: usize,
    /// Whether this entry may replace an equivalent one already running
    pub override_running: bool,
}

impl CheckQueueEntry {
    pub fn new(doc_id: DocId, range_start: ParagraphRef, range_end: ParagraphRef) -> Self {
        Self {
            doc_id,
            range_start,
            range_end,
            cache_slot: 0,
            check_index: 0,
            override_running: false,
        }
    }

    pub fn with_cache_slot(mut self, cache_slot: usize) -> Self {
        self.cache_slot = cache_slot;
        self
    }

    pub fn with_check_index(mut self, check_index: usize) -> Self {
        self.check_index = check_index;
        self
    }

    pub fn with_override_running(mut self, override_running: bool) -> Self {
        self.override_running = override_running;
        self
    }

    /// Dedup key: two entries aiming at the same document range and cache
    /// slot are the same piece of work.
    pub fn same_target(&self, other: &CheckQueueEntry) -> bool {
        self.doc_id == other.doc_id
            && self.range_start == other.range_start
            && self.range_end == other.range_end
            && self.cache_slot == other.cache_slot
    }
}

/// A document that can supply pending check entries of its own.
pub trait CheckSource: Send + Sync {
    fn doc_id(&self) -> DocId;

    /// Disposed documents are skipped by every scan.
    fn is_disposed(&self) -> bool;

    /// The document's next pending entry near `hint`, if any.
    fn next_entry(&self, hint: Option<ParagraphRef>) -> Result<Option<CheckQueueEntry>, StoreError>;
}

/// Runs the actual grammar/style check for one dequeued entry.
#[async_trait]
pub trait CheckRunner: Send + Sync {
    async fn run_check(&self, entry: &CheckQueueEntry) -> AiResult<()>;
}

/// Deduplicated priority list of pending checks plus the document scan.
pub struct CheckQueue {
    entries: Mutex<VecDeque<CheckQueueEntry>>,
    sources: Mutex<Vec<Arc<dyn CheckSource>>>,
    notify: Notify,
    stopped: AtomicBool,
}

impl CheckQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(VecDeque::new()),
            sources: Mutex::new(Vec::new()),
            notify: Notify::new(),
            stopped: AtomicBool::new(false),
        })
    }

    /// Make an open document visible to the scan. Documents registered
    /// while a scan is underway are picked up by the next one.
    pub fn register_source(&self, source: Arc<dyn CheckSource>) {
        self.sources.lock().expect("sources lock").push(source);
        // The new document may already have pending work; wake the worker.
        self.notify.notify_one();
    }

    /// Insert an entry, replacing any queued entry with the same target.
    pub fn enqueue(&self, entry: CheckQueueEntry, priority: bool) {
        if self.stopped.load(Ordering::SeqCst) {
            debug!(doc = %entry.doc_id, "check queue stopped, entry dropped");
            return;
        }
        {
            let mut entries = self.entries.lock().expect("entries lock");
            entries.retain(|e| !e.same_target(&entry));
            if priority {
                entries.push_front(entry);
            } else {
                entries.push_back(entry);
            }
        }
        self.notify.notify_one();
    }

    /// Pop the head of the internal list.
    pub fn dequeue(&self) -> Option<CheckQueueEntry> {
        self.entries.lock().expect("entries lock").pop_front()
    }

    /// Ask the open documents for their next pending entry, round-robin.
    ///
    /// The scan starts at the document matching `hint` (or the first open,
    /// non-disposed one), asks it for an entry near the hint paragraph, and
    /// wraps once over the remaining documents. Entries of disposed
    /// documents are never returned; a failing document is logged and
    /// scanned past.
    pub fn dequeue_next_for(&self, hint: Option<(DocId, ParagraphRef)>) -> Option<CheckQueueEntry> {
        let sources: Vec<Arc<dyn CheckSource>> =
            self.sources.lock().expect("sources lock").clone();
        if sources.is_empty() {
            return None;
        }

        let start = hint
            .as_ref()
            .and_then(|(doc, _)| {
                sources
                    .iter()
                    .position(|s| !s.is_disposed() && s.doc_id() == *doc)
            })
            .unwrap_or(0);

        for offset in 0..sources.len() {
            let source = &sources[(start + offset) % sources.len()];
            if source.is_disposed() {
                continue;
            }
            let paragraph_hint = match (&hint, offset) {
                (Some((doc, par)), 0) if source.doc_id() == *doc => Some(*par),
                _ => None,
            };
            match source.next_entry(paragraph_hint) {
                Ok(Some(entry)) => return Some(entry),
                Ok(None) => {}
                Err(e) => {
                    warn!(doc = %source.doc_id(), error = %e, "check source failed, skipping");
                }
            }
        }
        None
    }

    /// Discard all pending work and refuse further entries. One-way; used
    /// by the circuit breaker when text AI support is disabled.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.entries.lock().expect("entries lock").clear();
        self.notify.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("entries lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the queue's worker: drain one entry at a time, fall back to
    /// the document scan when the list is empty, sleep until woken when
    /// there is nothing anywhere.
    pub fn start_worker(
        self: &Arc<Self>,
        runner: Arc<dyn CheckRunner>,
    ) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            debug!("check worker started");
            let mut last_hint: Option<(DocId, ParagraphRef)> = None;
            loop {
                if queue.is_stopped() {
                    break;
                }
                let entry = queue
                    .dequeue()
                    .or_else(|| queue.dequeue_next_for(last_hint.take()));
                match entry {
                    Some(entry) => {
                        if let Err(e) = runner.run_check(&entry).await {
                            warn!(doc = %entry.doc_id, error = %e, "check failed");
                        }
                        last_hint = Some((entry.doc_id.clone(), entry.range_end));
                    }
                    None => queue.notify.notified().await,
                }
            }
            debug!("check worker stopped");
        })
    }
}
