//! Structured Output Extraction
//!
//! Models asked for JSON frequently wrap it in markdown fences or prose.
//! This module locates the JSON payload inside free-form model text and
//! parses it, with its own error taxonomy so callers can distinguish
//! "no JSON present" from "JSON present but malformed".
//!
//! Candidate order: the whole trimmed text, then a ```json fence, then any
//! fence whose body starts with a JSON delimiter, then the widest bare
//! object slice, then the widest bare array slice. The first candidate
//! that parses wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error types for JSON extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractError {
    /// The text contains nothing that looks like JSON
    NoJsonFound { message: String },
    /// A JSON candidate was located but failed to parse
    ParseError { message: String },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::NoJsonFound { message } => {
                write!(f, "No JSON found: {}", message)
            }
            ExtractError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract and parse the first well-formed JSON payload in model text.
pub fn extract_structured(text: &str) -> Result<Value, ExtractError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::NoJsonFound {
            message: "model returned empty text".to_string(),
        });
    }

    // The text may already be plain JSON with no wrapping
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let candidates = collect_candidates(trimmed);
    if candidates.is_empty() {
        return Err(ExtractError::NoJsonFound {
            message: format!(
                "no JSON candidate in text starting with {:?}",
                trimmed.chars().take(60).collect::<String>()
            ),
        });
    }

    let mut first_failure: Option<serde_json::Error> = None;
    for candidate in &candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(err) => {
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
    }

    // candidates is non-empty here, so first_failure is set
    let message = first_failure.map(|e| e.to_string()).unwrap_or_default();
    Err(ExtractError::ParseError { message })
}

/// Collect JSON candidates in priority order. Duplicates are fine; parsing
/// stops at the first success.
fn collect_candidates(trimmed: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    // ```json fence
    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            candidates.push(after_fence[..end].trim().to_string());
        }
    }

    // Any fence; skip the optional language identifier on the first line
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let after_lang = if let Some(nl) = after_fence.find('\n') {
            &after_fence[nl + 1..]
        } else {
            after_fence
        };
        if let Some(end) = after_lang.find("```") {
            let content = after_lang[..end].trim();
            if content.starts_with('{') || content.starts_with('[') {
                candidates.push(content.to_string());
            }
        }
    }

    // Widest bare object slice
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(trimmed[start..=end].to_string());
        }
    }

    // Widest bare array slice
    if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        if start < end {
            candidates.push(trimmed[start..=end].to_string());
        }
    }

    candidates
}
