//! Shared test doubles: scripted backends standing in for HTTP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;

use redpen::{AiBackend, AiError, AiResult, RequestEntry};

static TRACING: Once = Once::new();

/// Route engine tracing through the test harness; honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Backend that answers every text request with a fixed string and tracks
/// how many calls run at the same time.
pub struct ScriptedBackend {
    pub answer: String,
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub concurrent: AtomicUsize,
    pub max_concurrent: AtomicUsize,
}

impl ScriptedBackend {
    pub fn answering(answer: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.into(),
            delay: Duration::from_millis(5),
            calls: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
        })
    }

    async fn track<T>(&self, value: T) -> T {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.concurrent.fetch_sub(1, Ordering::SeqCst);
        value
    }
}

#[async_trait]
impl AiBackend for ScriptedBackend {
    async fn perform_text(&self, entry: &RequestEntry) -> AiResult<String> {
        self.track(Ok(format!("{} #{}", self.answer, entry.text))).await
    }

    async fn perform_image(&self, _entry: &RequestEntry) -> AiResult<String> {
        self.track(Ok("http://host/img/1.png".to_string())).await
    }

    async fn perform_speech(&self, _entry: &RequestEntry) -> AiResult<Vec<u8>> {
        self.track(Ok(b"RIFFdata".to_vec())).await
    }
}

/// Backend whose every call fails the way an unreachable backend does after
/// its retry bound is exhausted.
pub struct UnreachableBackend {
    pub calls: AtomicUsize,
}

impl UnreachableBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn fail<T>(&self) -> AiResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AiError::unreachable("connection refused after 5 attempts"))
    }
}

#[async_trait]
impl AiBackend for UnreachableBackend {
    async fn perform_text(&self, _entry: &RequestEntry) -> AiResult<String> {
        self.fail()
    }

    async fn perform_image(&self, _entry: &RequestEntry) -> AiResult<String> {
        self.fail()
    }

    async fn perform_speech(&self, _entry: &RequestEntry) -> AiResult<Vec<u8>> {
        self.fail()
    }
}
