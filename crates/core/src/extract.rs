//! Outline extraction from free-form model replies.
//!
//! Models wrap their JSON in prose, fences, or nothing at all. The candidate
//! payload is located with a fixed, first-match-wins scan:
//!
//! 1. a ```` ```json ```` fence, up to the next fence
//! 2. any ```` ``` ```` fence, up to the next fence
//! 3. the first `{` through the last `}`
//! 4. the whole trimmed reply
//!
//! The candidate is then validated as a flat outline (`titles`) or, failing
//! that, a rich outline (`slides`).

use crate::{Error, FlatOutline, GenerationReply, Result, RichOutline, StructuredOutline};
use serde_json::{Map, Value};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Number of payload characters quoted in extraction errors.
const PREVIEW_CHARS: usize = 100;

/// Extract a validated outline from a model reply.
pub fn extract(reply: &GenerationReply) -> Result<StructuredOutline> {
    extract_outline(reply.as_str())
}

/// Extract a validated outline from raw reply text.
pub fn extract_outline(reply: &str) -> Result<StructuredOutline> {
    let candidate = candidate_payload(reply);
    log::debug!(
        "Extracted candidate payload ({} of {} chars)",
        candidate.len(),
        reply.len()
    );

    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        Error::ExtractionError(format!(
            "Reply does not contain a parseable JSON object: {} (payload: {}...)",
            e,
            preview(candidate)
        ))
    })?;

    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(Error::ExtractionError(format!(
                "Expected a JSON object, found {}",
                value_kind(&other)
            )));
        }
    };

    validate(object)
}

/// Locate the candidate payload inside a reply.
pub fn candidate_payload(reply: &str) -> &str {
    let content = reply.trim();

    if let Some(payload) = fenced_payload(content, JSON_FENCE) {
        return payload;
    }

    if let Some(payload) = fenced_payload(content, FENCE) {
        return payload;
    }

    if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
        if start < end {
            return &content[start..=end];
        }
    }

    content
}

/// Text between the end of `marker` and the next fence, trimmed.
///
/// An unterminated fence runs to the end of the reply.
fn fenced_payload<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    let start = content.find(marker)? + marker.len();
    let rest = &content[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Resolve the object into one of the two outline shapes, flat first.
fn validate(object: Map<String, Value>) -> Result<StructuredOutline> {
    if object.contains_key("titles") {
        let flat: FlatOutline = serde_json::from_value(Value::Object(object))
            .map_err(|e| Error::ExtractionError(format!("Invalid flat outline: {}", e)))?;

        if flat.titles.is_empty() {
            return Err(Error::ExtractionError(
                "Flat outline contains no titles".to_string(),
            ));
        }
        if flat.bullets.len() > flat.titles.len() {
            log::warn!(
                "Outline has {} bullet lists for {} titles; extras are ignored",
                flat.bullets.len(),
                flat.titles.len()
            );
        }

        return Ok(StructuredOutline::Flat(flat));
    }

    if object.contains_key("slides") {
        let rich: RichOutline = serde_json::from_value(Value::Object(object))
            .map_err(|e| Error::ExtractionError(format!("Invalid rich outline: {}", e)))?;

        if rich.slides.is_empty() {
            log::warn!("Outline has no slides; the deck will contain only a title slide");
        }

        return Ok(StructuredOutline::Rich(rich));
    }

    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    Err(Error::ExtractionError(format!(
        "JSON object has neither `titles` nor `slides` (keys: {:?})",
        keys
    )))
}

fn preview(payload: &str) -> String {
    payload.chars().take(PREVIEW_CHARS).collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
