//! Request Body Construction
//!
//! Pure functions that turn a `RequestEntry` into the JSON body the
//! configured backend expects. Text requests follow the backend's dialect;
//! image and speech requests have one fixed shape each, independent of it.

use serde_json::{json, Value};

use redpen_core::{BackendConfig, Dialect, RequestCategory, RequestEntry};

/// Fold line breaks in free text to single spaces before interpolation.
///
/// The wire format is one JSON body per request; embedded paragraph breaks
/// belong to the document model, not the prompt.
pub fn escape_text(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Instruction and input joined the way prompt-style dialects expect.
fn prompt_of(entry: &RequestEntry) -> String {
    let instruction = escape_text(&entry.instruction);
    let text = escape_text(&entry.text);
    if text.is_empty() {
        instruction
    } else {
        format!("{}: {}", instruction, text)
    }
}

/// Build the URL and JSON body for one request.
pub fn build_request(config: &BackendConfig, entry: &RequestEntry) -> (String, Value) {
    let body = match entry.category {
        RequestCategory::Text => text_body(config, entry),
        RequestCategory::Image => image_body(entry),
        RequestCategory::Speech => speech_body(config, entry),
    };
    (config.base_url.clone(), body)
}

fn text_body(config: &BackendConfig, entry: &RequestEntry) -> Value {
    match config.dialect {
        Dialect::Chat => {
            let mut body = json!({
                "model": config.model,
                "stream": false,
                "messages": [{ "role": "user", "content": prompt_of(entry) }],
                "temperature": entry.temperature,
            });
            if let Some(locale) = &entry.locale {
                body["language"] = json!(locale);
            }
            if let Some(seed) = entry.seed {
                body["seed"] = json!(seed);
            }
            body
        }
        Dialect::Edits => json!({
            "model": config.model,
            "instruction": escape_text(&entry.instruction),
            "input": escape_text(&entry.text),
            "temperature": entry.temperature,
        }),
        Dialect::Completions | Dialect::Generate => {
            let mut body = json!({
                "model": config.model,
                "prompt": prompt_of(entry),
                "temperature": entry.temperature,
            });
            if config.dialect == Dialect::Generate {
                body["stream"] = json!(false);
            }
            if let Some(seed) = entry.seed {
                body["seed"] = json!(seed);
            }
            body
        }
    }
}

fn image_body(entry: &RequestEntry) -> Value {
    let mut body = json!({
        "prompt": escape_text(&entry.instruction),
        "size": format!("{}x{}", entry.width, entry.height),
        "step": entry.step,
    });
    if let Some(seed) = entry.seed {
        body["seed"] = json!(seed);
    }
    body
}

fn speech_body(config: &BackendConfig, entry: &RequestEntry) -> Value {
    json!({
        "model": config.model,
        "input": escape_text(&entry.text),
    })
}
