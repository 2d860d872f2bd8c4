//! Output Normalization
//!
//! Backends echo prompts, wrap answers in braces, and annotate rewrites
//! inconsistently; this pipeline cleans the extracted answer into
//! paragraph-safe text. Every stage is heuristic by design and individually
//! unit-tested. The paragraph separator is `\r` after separator
//! normalization.

/// Paragraph separator used inside normalized text.
const PARA_SEP: char = '\r';

/// Clean raw model output.
///
/// * `raw` - the extracted answer text
/// * `original` - the input text the request was built from
/// * `instruction` - the instruction string sent with the request
/// * `only_one_paragraph` - select the stricter single-paragraph path
pub fn normalize_output(
    raw: &str,
    original: &str,
    instruction: &str,
    only_one_paragraph: bool,
) -> String {
    let text = strip_wrapping_braces(raw, original);
    let text = normalize_separators(&text);
    let text = if only_one_paragraph {
        isolate_single_paragraph(&text, original, instruction)
    } else {
        text
    };
    strip_arrow_annotation(&text, original)
}

/// Stage 1: if the text is wholly `{…}`-wrapped and the original input was
/// not, strip one layer of braces.
pub fn strip_wrapping_braces(text: &str, original: &str) -> String {
    let trimmed = text.trim();
    let original = original.trim();
    let wrapped = |s: &str| s.starts_with('{') && s.ends_with('}');
    if trimmed.len() >= 2 && wrapped(trimmed) && !wrapped(original) {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Stage 2: fold `\n` into the `\r` paragraph separator, collapse doubled
/// separators, and trim.
pub fn normalize_separators(text: &str) -> String {
    let mut out = text.replace('\n', "\r");
    while out.contains("\r\r") {
        out = out.replace("\r\r", "\r");
    }
    out.trim().to_string()
}

/// First clause of the instruction, up to the first sentence punctuation.
fn instruction_clause(instruction: &str) -> &str {
    instruction
        .split(['.', '!', '?'])
        .next()
        .unwrap_or(instruction)
        .trim()
}

/// Stage 3: pick the answer paragraph and drop echoed instruction prefixes.
pub fn isolate_single_paragraph(text: &str, original: &str, instruction: &str) -> String {
    let clause = instruction_clause(instruction);
    let parts: Vec<&str> = text.split(PARA_SEP).collect();

    // More than one paragraph: the first one is often a preamble ("Here is
    // the corrected text:" or an instruction echo); the answer is the second.
    let kept = if parts.len() > 1 {
        let first = parts[0].trim();
        let echoes = first.ends_with(':') || (!clause.is_empty() && first.contains(clause));
        if echoes {
            parts[1]
        } else {
            parts[0]
        }
    } else {
        parts[0]
    };
    let kept = strip_wrapping_braces(kept, original);

    // Colon rule: a leading "Label:" (or a full echoed instruction plus a
    // label) still prefixes the answer.
    let restates = !clause.is_empty() && kept.contains(clause);
    if kept.contains(':') && (!original.contains(':') || restates) {
        let whole_echo = !instruction.trim().is_empty() && kept.contains(instruction.trim());
        let skip = if whole_echo { 2 } else { 1 };
        let segments: Vec<&str> = kept.split(':').collect();
        if segments.len() > skip {
            let rejoined = segments[skip..].join(":").trim().to_string();
            return strip_wrapping_braces(&rejoined, original);
        }
    }
    kept
}

/// Stage 4: undo the `input -> output` annotation some backends produce for
/// rewrite requests. Only fires when the arrow was not already in the input
/// and the output starts by echoing it.
pub fn strip_arrow_annotation(text: &str, original: &str) -> String {
    let original = original.trim();
    if text.contains("->") && !original.contains("->") && text.starts_with(original) {
        match text.split_once("->") {
            Some((_, rest)) => rest.trim().to_string(),
            None => text.to_string(),
        }
    } else {
        text.to_string()
    }
}
