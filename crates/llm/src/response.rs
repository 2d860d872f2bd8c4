//! Response Parsing
//!
//! Backends answer in one of two shapes: a single JSON object with a
//! `choices` array, or line-delimited JSON where every line carries a piece
//! of the answer and a `done` flag. Which shape arrived is sniffed from the
//! first line only — a best-effort discriminator, not a protocol guarantee.

use serde::Deserialize;
use serde_json::Value;

use redpen_core::{AiError, AiResult, Dialect, RequestCategory};

/// Parse a raw response body into the answer text (or image URL).
///
/// Speech responses are raw audio bytes and never reach this function.
pub fn parse_response(category: RequestCategory, dialect: Dialect, raw: &str) -> AiResult<String> {
    match category {
        RequestCategory::Text => parse_text(dialect, raw),
        RequestCategory::Image => parse_image(raw),
        RequestCategory::Speech => Err(AiError::protocol(
            "speech responses carry raw audio, not JSON",
        )),
    }
}

fn parse_text(dialect: Dialect, raw: &str) -> AiResult<String> {
    let first_line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let content = if looks_streaming(first_line) {
        parse_streaming(raw)?
    } else {
        parse_single(dialect, raw)?
    };
    Ok(unwrap_nested(&content))
}

/// A line-delimited response announces itself by a `message` or `response`
/// key on its first line. Anything else is re-parsed as a single object.
fn looks_streaming(first_line: &str) -> bool {
    serde_json::from_str::<Value>(first_line.trim())
        .map(|v| v.get("message").is_some() || v.get("response").is_some())
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct SingleResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<LineMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LineMessage {
    #[serde(default)]
    content: Option<String>,
}

fn parse_single(dialect: Dialect, raw: &str) -> AiResult<String> {
    let response: SingleResponse = serde_json::from_str(raw.trim())
        .map_err(|e| AiError::protocol(format!("response is not valid JSON: {}", e)))?;

    // A body-level error field is the backend talking, not a parse failure.
    if let Some(err) = response.error {
        return Err(AiError::reported(render_error(&err)));
    }

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::protocol("response has no choices"))?;

    match dialect {
        Dialect::Chat => choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| AiError::protocol("chat choice has no message content")),
        Dialect::Edits | Dialect::Completions | Dialect::Generate => choice
            .text
            .ok_or_else(|| AiError::protocol("choice has no text field")),
    }
}

#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    message: Option<LineMessage>,
    #[serde(default)]
    response: Option<String>,
}

/// Concatenate the content of every line, in order, until `done` is set.
/// Trailing lines after `done` are ignored.
fn parse_streaming(raw: &str) -> AiResult<String> {
    let mut out = String::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: StreamLine = serde_json::from_str(line)
            .map_err(|e| AiError::protocol(format!("stream line is not valid JSON: {}", e)))?;
        if let Some(content) = parsed.message.and_then(|m| m.content) {
            out.push_str(&content);
        } else if let Some(response) = parsed.response {
            out.push_str(&response);
        }
        if parsed.done {
            break;
        }
    }
    Ok(out)
}

/// Compatibility shim: one supported backend variant double-encodes the
/// answer as a JSON object inside the content string. If the content parses
/// as an object, descend into its last key's value; on any failure keep the
/// content as-is. Remove once that backend variant is gone.
fn unwrap_nested(content: &str) -> String {
    let trimmed = content.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return content.to_string();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => match map.iter().last() {
            Some((_, Value::String(s))) => s.clone(),
            Some((_, value)) => value.to_string(),
            None => content.to_string(),
        },
        _ => content.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    url: Option<String>,
}

fn parse_image(raw: &str) -> AiResult<String> {
    let response: ImageResponse = serde_json::from_str(raw.trim())
        .map_err(|e| AiError::protocol(format!("image response is not valid JSON: {}", e)))?;
    if let Some(err) = response.error {
        return Err(AiError::reported(render_error(&err)));
    }
    response
        .data
        .into_iter()
        .next()
        .and_then(|d| d.url)
        .ok_or_else(|| AiError::protocol("image response has no data URL"))
}

fn render_error(err: &Value) -> String {
    err.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}
