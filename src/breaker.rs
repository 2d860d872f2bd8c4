//! Circuit Breaker
//!
//! After a terminal failure the affected category is switched off for good:
//! the feature flag flips, the check queue (for text) is stopped and
//! emptied, and observers such as an open AI dialog are told to close.
//! Re-enabling is an explicit user action outside this engine; the breaker
//! never resets itself.

use std::sync::{Arc, Mutex};

use tracing::{error, info};

use redpen_core::{FeatureFlags, RequestCategory};

use crate::check_queue::CheckQueue;

/// Notified once per tripped category; used by interactive surfaces that
/// must stop issuing requests immediately.
pub trait BreakerObserver: Send + Sync {
    fn on_category_disabled(&self, category: RequestCategory);
}

/// One-way per-category disable switch.
pub struct CircuitBreaker {
    flags: Arc<dyn FeatureFlags>,
    check_queue: Mutex<Option<Arc<CheckQueue>>>,
    observers: Mutex<Vec<Arc<dyn BreakerObserver>>>,
}

impl CircuitBreaker {
    pub fn new(flags: Arc<dyn FeatureFlags>) -> Arc<Self> {
        Arc::new(Self {
            flags,
            check_queue: Mutex::new(None),
            observers: Mutex::new(Vec::new()),
        })
    }

    /// Wire up the check queue the text category owns. Kept separate from
    /// construction because the queue and the breaker reference each other's
    /// owner.
    pub fn attach_check_queue(&self, queue: Arc<CheckQueue>) {
        *self.check_queue.lock().expect("breaker lock") = Some(queue);
    }

    pub fn add_observer(&self, observer: Arc<dyn BreakerObserver>) {
        self.observers.lock().expect("breaker lock").push(observer);
    }

    /// Disable a category after a terminal failure. Idempotent per
    /// incident: a category that is already off is left alone.
    pub fn trip(&self, category: RequestCategory) {
        if !self.flags.is_enabled(category) {
            info!(%category, "breaker already tripped");
            return;
        }
        error!(%category, "persistent backend failure, disabling AI support");
        self.flags.set_enabled(category, false);

        if category == RequestCategory::Text {
            if let Some(queue) = self.check_queue.lock().expect("breaker lock").as_ref() {
                queue.stop();
            }
        }

        let observers: Vec<Arc<dyn BreakerObserver>> =
            self.observers.lock().expect("breaker lock").clone();
        for observer in observers {
            observer.on_category_disabled(category);
        }
    }
}
