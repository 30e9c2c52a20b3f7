//! Lenient JSON recovery from language-model text output.
//!
//! The generation endpoint is asked for pure JSON but gives no schema
//! guarantee: responses arrive wrapped in prose, fenced code blocks, or
//! both. This module reduces such a blob to the single JSON value it is
//! expected to contain, in two stages:
//!
//! 1. strip a leading/trailing code fence if present;
//! 2. otherwise slice from the first opening delimiter to the last matching
//!    closing delimiter.
//!
//! This is a boundary adapter for an untrusted text source, not a general
//! JSON repair parser. Anything it cannot reduce fails with
//! [`MalformedResponse`].

use serde_json::Value;
use thiserror::Error;

/// Maximum characters of raw model output kept in a diagnostic excerpt.
const EXCERPT_MAX_CHARS: usize = 160;

/// The model's text could not be reduced to the expected JSON value.
#[derive(Debug, Error)]
#[error("model response is not valid JSON ({reason}): {excerpt}")]
pub struct MalformedResponse {
    /// Truncated excerpt of the raw text, for diagnostics.
    pub excerpt: String,
    /// What went wrong (missing delimiters, parse error, wrong shape).
    pub reason: String,
}

impl MalformedResponse {
    /// Build an error carrying a truncated excerpt of `raw`.
    pub fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            excerpt: excerpt(raw),
            reason: reason.into(),
        }
    }
}

fn excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() > EXCERPT_MAX_CHARS {
        let shortened: String = trimmed.chars().take(EXCERPT_MAX_CHARS).collect();
        format!("{shortened}...[truncated]")
    } else {
        trimmed.to_owned()
    }
}

/// Recover the single JSON value (object or array) contained in `raw`.
///
/// # Errors
///
/// Returns [`MalformedResponse`] when no opening/closing delimiter pair is
/// found or the recovered span fails to parse.
pub fn json_value(raw: &str) -> Result<Value, MalformedResponse> {
    let text = strip_fences(raw.trim());

    let missing = || MalformedResponse::new(raw, "no JSON object or array delimiters found");
    let start = text.find(['{', '[']).ok_or_else(missing)?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer).ok_or_else(missing)?;
    if end < start {
        return Err(missing());
    }

    serde_json::from_str(&text[start..=end]).map_err(|e| MalformedResponse::new(raw, e.to_string()))
}

/// Recover a JSON array from `raw`.
///
/// # Errors
///
/// Returns [`MalformedResponse`] if the recovered value is not an array.
pub fn json_array(raw: &str) -> Result<Value, MalformedResponse> {
    let value = json_value(raw)?;
    if value.is_array() {
        Ok(value)
    } else {
        Err(MalformedResponse::new(raw, "expected a JSON array"))
    }
}

/// Recover a JSON object from `raw`.
///
/// # Errors
///
/// Returns [`MalformedResponse`] if the recovered value is not an object.
pub fn json_object(raw: &str) -> Result<Value, MalformedResponse> {
    let value = json_value(raw)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(MalformedResponse::new(raw, "expected a JSON object"))
    }
}

/// Strip a surrounding fenced code block (```json ... ``` or ``` ... ```).
///
/// Returns the inner text when the input starts with a fence; otherwise the
/// input unchanged. An unterminated fence keeps everything after the opener.
fn strip_fences(text: &str) -> &str {
    let Some(after_open) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") up to the first newline.
    let body = match after_open.find('\n') {
        Some(pos) => after_open.get(pos..).unwrap_or(""),
        None => after_open,
    };
    match body.rfind("```") {
        Some(close) => body.get(..close).unwrap_or(body).trim(),
        None => body.trim(),
    }
}
