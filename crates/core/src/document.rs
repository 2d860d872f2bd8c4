//! Document-Side Types
//!
//! The engine never talks to the host editor directly. It sees documents
//! through the `ParagraphStore` trait: paragraph lengths and text by logical
//! index, the chapter range around a paragraph, and text replacement.
//! `InMemoryStore` is a self-contained implementation used by tests and by
//! hosts that keep their own paragraph snapshot.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identity of an open document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Structural kind of a logical paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphKind {
    /// Ordinary body text
    TextBody,
    /// A heading; headings delimit chapters
    Heading,
    /// Not yet mapped into chapter structure
    Unmapped,
}

/// A logical paragraph reference: index plus structural kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParagraphRef {
    pub index: usize,
    pub kind: ParagraphKind,
}

impl ParagraphRef {
    pub fn new(index: usize, kind: ParagraphKind) -> Self {
        Self { index, kind }
    }

    /// A body-text paragraph at `index`.
    pub fn body(index: usize) -> Self {
        Self::new(index, ParagraphKind::TextBody)
    }
}

/// Read/write access to one document's paragraphs.
///
/// Implementations are supplied by the host. All methods may fail with a
/// `StoreError`; callers must treat the affected paragraph as inaccessible
/// rather than retry.
pub trait ParagraphStore: Send + Sync {
    /// Number of logical paragraphs in the document
    fn paragraph_count(&self) -> Result<usize, StoreError>;

    /// Character length of the paragraph at `index`
    fn paragraph_len(&self, index: usize) -> Result<usize, StoreError>;

    /// Text of the paragraph at `index`
    fn paragraph_text(&self, index: usize) -> Result<String, StoreError>;

    /// The chapter range `[start, end)` containing `par`.
    ///
    /// Chapters are heading-delimited; a document without headings is one
    /// chapter spanning every paragraph.
    fn chapter_range(&self, par: ParagraphRef) -> Result<(usize, usize), StoreError>;

    /// Replace the text of the paragraph at `index`
    fn replace_paragraph_text(&self, index: usize, new_text: &str) -> Result<(), StoreError>;
}

/// Paragraph store backed by a plain vector.
pub struct InMemoryStore {
    paragraphs: std::sync::RwLock<Vec<(String, ParagraphKind)>>,
}

impl InMemoryStore {
    pub fn new(paragraphs: Vec<(String, ParagraphKind)>) -> Self {
        Self {
            paragraphs: std::sync::RwLock::new(paragraphs),
        }
    }

    /// All paragraphs as body text, no headings.
    pub fn from_texts<S: Into<String>>(texts: Vec<S>) -> Self {
        Self::new(
            texts
                .into_iter()
                .map(|t| (t.into(), ParagraphKind::TextBody))
                .collect(),
        )
    }
}

impl ParagraphStore for InMemoryStore {
    fn paragraph_count(&self) -> Result<usize, StoreError> {
        Ok(self.paragraphs.read().expect("store lock").len())
    }

    fn paragraph_len(&self, index: usize) -> Result<usize, StoreError> {
        let pars = self.paragraphs.read().expect("store lock");
        pars.get(index)
            .map(|(t, _)| t.chars().count())
            .ok_or(StoreError::OutOfBounds { index })
    }

    fn paragraph_text(&self, index: usize) -> Result<String, StoreError> {
        let pars = self.paragraphs.read().expect("store lock");
        pars.get(index)
            .map(|(t, _)| t.clone())
            .ok_or(StoreError::OutOfBounds { index })
    }

    fn chapter_range(&self, par: ParagraphRef) -> Result<(usize, usize), StoreError> {
        let pars = self.paragraphs.read().expect("store lock");
        if par.index >= pars.len() {
            return Err(StoreError::OutOfBounds { index: par.index });
        }
        // Chapter start: the nearest heading at or before the paragraph.
        let start = pars[..=par.index]
            .iter()
            .rposition(|(_, k)| *k == ParagraphKind::Heading)
            .unwrap_or(0);
        // Chapter end: the next heading strictly after the paragraph.
        let end = pars
            .iter()
            .enumerate()
            .skip(par.index + 1)
            .find(|(_, (_, k))| *k == ParagraphKind::Heading)
            .map(|(i, _)| i)
            .unwrap_or(pars.len());
        Ok((start, end))
    }

    fn replace_paragraph_text(&self, index: usize, new_text: &str) -> Result<(), StoreError> {
        let mut pars = self.paragraphs.write().expect("store lock");
        match pars.get_mut(index) {
            Some((t, _)) => {
                *t = new_text.to_string();
                Ok(())
            }
            None => Err(StoreError::OutOfBounds { index }),
        }
    }
}
