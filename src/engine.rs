//! Engine Facade
//!
//! Wires the queue, worker, check queue, and breaker together behind the
//! calls the host editor actually makes. Every submit checks the category's
//! feature flag first; a disabled category answers immediately with an
//! empty result instead of queueing doomed work.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use redpen_core::{
    AtomicFlags, BackendConfig, DocId, FeatureFlags, ParagraphRef, RequestCategory, RequestEntry,
};
use redpen_llm::{AiBackend, HttpBackend};

use crate::breaker::CircuitBreaker;
use crate::check_queue::{CheckQueue, CheckQueueEntry, CheckRunner, CheckSource};
use crate::queue::RequestQueue;

/// The AI engine: one backend, one request queue, one check queue.
pub struct AiEngine {
    queue: Arc<RequestQueue>,
    check_queue: Arc<CheckQueue>,
    breaker: Arc<CircuitBreaker>,
    flags: Arc<dyn FeatureFlags>,
}

impl AiEngine {
    /// Engine over an HTTP backend, with all categories enabled.
    pub fn new(config: BackendConfig) -> Self {
        let watchdog = config.watchdog();
        let flags: Arc<dyn FeatureFlags> = Arc::new(AtomicFlags::all_enabled());
        Self::with_backend(Arc::new(HttpBackend::new(config)), flags, watchdog)
    }

    /// Engine over any backend, for hosts that persist their own flags and
    /// for tests that script the backend.
    pub fn with_backend(
        backend: Arc<dyn AiBackend>,
        flags: Arc<dyn FeatureFlags>,
        watchdog: std::time::Duration,
    ) -> Self {
        let breaker = CircuitBreaker::new(flags.clone());
        let check_queue = CheckQueue::new();
        breaker.attach_check_queue(check_queue.clone());
        let queue = RequestQueue::new(backend, flags.clone(), breaker.clone(), watchdog);
        Self {
            queue,
            check_queue,
            breaker,
            flags,
        }
    }

    /// Grammar/style rewrite. Blocks until the worker publishes the result;
    /// `None` means the request failed terminally or the category is off.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit_text_request(
        &self,
        instruction: &str,
        text: &str,
        temperature: f32,
        seed: Option<u64>,
        locale: Option<&str>,
        only_one_paragraph: bool,
        priority: bool,
    ) -> Option<String> {
        if !self.flags.is_enabled(RequestCategory::Text) {
            debug!("text AI support is disabled, request refused");
            return None;
        }
        let mut entry = RequestEntry::text(instruction, text)
            .with_temperature(temperature)
            .with_only_one_paragraph(only_one_paragraph);
        if let Some(seed) = seed {
            entry = entry.with_seed(seed);
        }
        if let Some(locale) = locale {
            entry = entry.with_locale(locale);
        }
        let id = self.queue.submit(entry, priority);
        self.queue.await_result(id).await
    }

    /// Image generation; resolves to the generated image's URL.
    pub async fn submit_image_request(
        &self,
        instruction: &str,
        exclude: &str,
        width: u32,
        height: u32,
        seed: Option<u64>,
        priority: bool,
    ) -> Option<String> {
        if !self.flags.is_enabled(RequestCategory::Image) {
            debug!("image AI support is disabled, request refused");
            return None;
        }
        let mut entry = RequestEntry::image(instruction)
            .with_exclude(exclude)
            .with_size(width, height);
        if let Some(seed) = seed {
            entry = entry.with_seed(seed);
        }
        let id = self.queue.submit(entry, priority);
        self.queue.await_result(id).await
    }

    /// Text-to-speech; resolves to the file the audio was written to.
    pub async fn submit_speech_request(
        &self,
        text: &str,
        filename: impl Into<PathBuf>,
        priority: bool,
    ) -> Option<PathBuf> {
        if !self.flags.is_enabled(RequestCategory::Speech) {
            debug!("speech AI support is disabled, request refused");
            return None;
        }
        let entry = RequestEntry::speech(text, filename);
        let id = self.queue.submit(entry, priority);
        self.queue.await_result(id).await.map(PathBuf::from)
    }

    /// Queue a grammar/style check for a paragraph range.
    pub fn enqueue_check(&self, entry: CheckQueueEntry, priority: bool) {
        self.check_queue.enqueue(entry, priority);
    }

    /// Next pending check near `hint`, or from any open document.
    pub fn dequeue_next_check(
        &self,
        hint: Option<(DocId, ParagraphRef)>,
    ) -> Option<CheckQueueEntry> {
        self.check_queue
            .dequeue()
            .or_else(|| self.check_queue.dequeue_next_for(hint))
    }

    /// Make an open document visible to the check scan.
    pub fn register_check_source(&self, source: Arc<dyn CheckSource>) {
        self.check_queue.register_source(source);
    }

    /// Start the check queue's own worker.
    pub fn start_check_worker(&self, runner: Arc<dyn CheckRunner>) -> tokio::task::JoinHandle<()> {
        self.check_queue.start_worker(runner)
    }

    pub fn request_queue(&self) -> &Arc<RequestQueue> {
        &self.queue
    }

    pub fn check_queue(&self) -> &Arc<CheckQueue> {
        &self.check_queue
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn flags(&self) -> &Arc<dyn FeatureFlags> {
        &self.flags
    }
}
