//! Per-Category Feature Switches
//!
//! Each request category can be switched off independently, either by the
//! user or by the circuit breaker after persistent failure. Hosts that
//! persist the switches implement `FeatureFlags` themselves; `AtomicFlags`
//! is the in-process implementation used everywhere else.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::request::RequestCategory;

/// Read/write access to the per-category "AI support enabled" switches.
pub trait FeatureFlags: Send + Sync {
    fn is_enabled(&self, category: RequestCategory) -> bool;
    fn set_enabled(&self, category: RequestCategory, enabled: bool);
}

/// Lock-free `FeatureFlags` implementation, one flag per category.
pub struct AtomicFlags {
    text: AtomicBool,
    image: AtomicBool,
    speech: AtomicBool,
}

impl AtomicFlags {
    pub fn new(enabled: bool) -> Self {
        Self {
            text: AtomicBool::new(enabled),
            image: AtomicBool::new(enabled),
            speech: AtomicBool::new(enabled),
        }
    }

    /// All categories switched on.
    pub fn all_enabled() -> Self {
        Self::new(true)
    }

    fn flag(&self, category: RequestCategory) -> &AtomicBool {
        match category {
            RequestCategory::Text => &self.text,
            RequestCategory::Image => &self.image,
            RequestCategory::Speech => &self.speech,
        }
    }
}

impl Default for AtomicFlags {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl FeatureFlags for AtomicFlags {
    fn is_enabled(&self, category: RequestCategory) -> bool {
        self.flag(category).load(Ordering::SeqCst)
    }

    fn set_enabled(&self, category: RequestCategory, enabled: bool) {
        self.flag(category).store(enabled, Ordering::SeqCst);
    }
}
