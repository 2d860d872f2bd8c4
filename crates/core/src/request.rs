//! AI Work Units
//!
//! A `RequestEntry` is one unit of AI work flowing through the request queue.
//! Each category carries its own payload group and tuning defaults; the
//! constructors set both so call sites never assemble entries field by field.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Request id value meaning "not yet submitted".
///
/// The queue assigns real ids starting at 1; submitting an entry that already
/// carries a non-zero id is a duplicate submission and a programming error.
pub const UNSET_REQUEST_ID: u64 = 0;

/// The kind of AI work requested.
///
/// Each category has its own payload shape, its own feature-enabled flag,
/// and its own breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    /// Grammar/style rewrite of document text
    Text,
    /// Image generation from a prompt
    Image,
    /// Text-to-speech synthesis
    Speech,
}

impl std::fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestCategory::Text => write!(f, "text"),
            RequestCategory::Image => write!(f, "image"),
            RequestCategory::Speech => write!(f, "speech"),
        }
    }
}

/// One unit of AI work.
///
/// Owned by the queue it sits in until dequeued; the worker owns it
/// exclusively while processing.
#[derive(Debug, Clone)]
pub struct RequestEntry {
    pub category: RequestCategory,
    /// Assigned by the queue at submission; `UNSET_REQUEST_ID` until then
    pub id: u64,
    /// What the model is asked to do (Text/Image categories)
    pub instruction: String,
    /// The text operated on (Text) or spoken (Speech)
    pub text: String,
    /// Terms the model must leave untouched
    pub exclude: String,
    /// Target file for synthesized audio (Speech category)
    pub filename: Option<PathBuf>,
    pub temperature: f32,
    pub seed: Option<u64>,
    /// Diffusion steps (Image category)
    pub step: u32,
    pub height: u32,
    pub width: u32,
    /// BCP-47 tag steering prompt construction (Text category)
    pub locale: Option<String>,
    /// Selects the stricter single-paragraph normalization path
    pub only_one_paragraph: bool,
}

impl RequestEntry {
    /// A grammar/style rewrite request.
    pub fn text(instruction: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            category: RequestCategory::Text,
            id: UNSET_REQUEST_ID,
            instruction: instruction.into(),
            text: text.into(),
            exclude: String::new(),
            filename: None,
            temperature: 0.7,
            seed: None,
            step: 0,
            height: 0,
            width: 0,
            locale: None,
            only_one_paragraph: false,
        }
    }

    /// An image generation request.
    pub fn image(instruction: impl Into<String>) -> Self {
        Self {
            category: RequestCategory::Image,
            id: UNSET_REQUEST_ID,
            instruction: instruction.into(),
            text: String::new(),
            exclude: String::new(),
            filename: None,
            temperature: 0.7,
            seed: None,
            step: 20,
            height: 512,
            width: 512,
            locale: None,
            only_one_paragraph: false,
        }
    }

    /// A text-to-speech request; the synthesized audio lands in `filename`.
    pub fn speech(text: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        Self {
            category: RequestCategory::Speech,
            id: UNSET_REQUEST_ID,
            instruction: String::new(),
            text: text.into(),
            exclude: String::new(),
            filename: Some(filename.into()),
            temperature: 0.0,
            seed: None,
            step: 0,
            height: 0,
            width: 0,
            locale: None,
            only_one_paragraph: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<String>) -> Self {
        self.exclude = exclude.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_only_one_paragraph(mut self, only_one: bool) -> Self {
        self.only_one_paragraph = only_one;
        self
    }
}
