//! Batch Planner
//!
//! Groups contiguous paragraphs into AI-sized chunks. A chunk must be big
//! enough to give the model context (at least `MIN_CHUNK_CHARS` characters)
//! and must never cross a chapter boundary, because a rewrite that straddles
//! a heading produces garbage on both sides of it.

use redpen_core::{ParagraphKind, ParagraphRef, ParagraphStore, StoreError};

/// Minimum accumulated character length for one chunk.
pub const MIN_CHUNK_CHARS: usize = 300;

/// Planner settings.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Send every paragraph on its own instead of chunking
    pub single_paragraph: bool,
    pub min_chunk_chars: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            single_paragraph: false,
            min_chunk_chars: MIN_CHUNK_CHARS,
        }
    }
}

/// Compute the paragraph range `[start, end)` to send for `target`.
///
/// Windows are built forward from the chapter start: each accumulates
/// paragraph lengths until it reaches the minimum chunk size, then the next
/// one starts. The window containing the target is returned; the last window
/// of a chapter may fall short of the minimum. An empty chapter yields its
/// own (empty) bounds.
///
/// Accessor failures propagate; the caller must treat the paragraph as
/// unbatchable and skip it rather than retry.
pub fn plan_range(
    store: &dyn ParagraphStore,
    target: ParagraphRef,
    options: &BatchOptions,
) -> Result<(usize, usize), StoreError> {
    // Paragraphs outside the chapter structure are always sent alone.
    if options.single_paragraph || target.kind == ParagraphKind::Unmapped {
        return Ok((target.index, target.index + 1));
    }

    let (chapter_start, chapter_end) = store.chapter_range(target)?;
    if chapter_start >= chapter_end {
        return Ok((chapter_start, chapter_end));
    }

    let mut index = chapter_start;
    loop {
        let window_start = index;
        let mut accumulated = 0usize;
        while index < chapter_end && accumulated < options.min_chunk_chars {
            accumulated += store.paragraph_len(index)?;
            index += 1;
        }
        // `index` is the exclusive window end: past the target means the
        // target is inside this window; past the chapter means we ran out.
        if index > target.index || index >= chapter_end {
            return Ok((window_start, index));
        }
    }
}
