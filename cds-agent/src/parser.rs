//! Extraction of structured output from free-form generative text.
//!
//! Model responses are expected to be a single JSON object but frequently
//! arrive wrapped in fenced code blocks or surrounded by prose. Extraction
//! tries, in order, first success wins:
//!
//! 1. the content of a ```json fence,
//! 2. the content of any ``` fence,
//! 3. the whole trimmed text,
//! 4. the substring from the first `{` to the last `}` inclusive.
//!
//! All stages failing is a recoverable condition: callers fall back to
//! treating the raw text as the answer body, tagged via the `parsed` flag
//! (and, for assessments, the error risk-level sentinel) so consumers can
//! tell a well-formed result from a degraded one.

use cds_core::{Citation, RiskLevel};
use serde_json::Value;

/// Try to extract a JSON object from raw model text.
pub fn extract_json(raw: &str) -> Option<Value> {
    let mut candidates: Vec<&str> = Vec::new();

    if let Some(pos) = raw.find("```json") {
        let after = &raw[pos + "```json".len()..];
        candidates.push(after.split("```").next().unwrap_or(after));
    }
    if let Some(pos) = raw.find("```") {
        let after = &raw[pos + "```".len()..];
        candidates.push(after.split("```").next().unwrap_or(after));
    }
    candidates.push(raw);
    let brace_slice = match (raw.find('{'), raw.rfind('}')) {
        (Some(first), Some(last)) if first < last => Some(&raw[first..=last]),
        _ => None,
    };
    candidates.extend(brace_slice);

    candidates
        .into_iter()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate.trim()).ok())
        .find(Value::is_object)
}

/// Normalize one model-supplied citation object, defaulting missing fields.
pub fn citation_from_value(value: &Value) -> Citation {
    Citation {
        source: value
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("NG12 PDF")
            .to_string(),
        page: value
            .get("page")
            .and_then(|p| p.as_u64().or_else(|| p.as_str().and_then(|s| s.parse().ok())))
            .unwrap_or(0) as u32,
        chunk_id: value
            .get("chunk_id")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        excerpt: value.get("excerpt").and_then(Value::as_str).unwrap_or("").to_string(),
    }
}

fn citations_from(value: &Value) -> Vec<Citation> {
    value
        .get("citations")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(citation_from_value).collect())
        .unwrap_or_default()
}

/// A chat answer recovered from model text.
#[derive(Debug, Clone)]
pub struct ChatOutput {
    /// The answer text (raw model text when extraction failed).
    pub answer: String,
    /// Model-supplied citations, normalized.
    pub citations: Vec<Citation>,
    /// Whether a JSON object was successfully extracted.
    pub parsed: bool,
}

/// Parse a chat response, falling back to the raw text on failure.
pub fn parse_chat_output(raw: &str) -> ChatOutput {
    match extract_json(raw) {
        Some(value) => ChatOutput {
            answer: value
                .get("answer")
                .and_then(Value::as_str)
                .map_or_else(|| raw.to_string(), str::to_string),
            citations: citations_from(&value),
            parsed: true,
        },
        None => ChatOutput { answer: raw.to_string(), citations: Vec::new(), parsed: false },
    }
}

/// An assessment recovered from model text.
#[derive(Debug, Clone)]
pub struct AssessmentOutput {
    /// The parsed risk level, if the model emitted a recognized one.
    pub risk_level: Option<RiskLevel>,
    /// The assessment text (raw model text when extraction failed).
    pub assessment: String,
    /// Model-supplied citations, normalized.
    pub citations: Vec<Citation>,
    /// Whether a JSON object was successfully extracted.
    pub parsed: bool,
}

/// Parse an assessment response, falling back to the raw text on failure.
pub fn parse_assessment_output(raw: &str) -> AssessmentOutput {
    match extract_json(raw) {
        Some(value) => AssessmentOutput {
            risk_level: value
                .get("risk_level")
                .and_then(Value::as_str)
                .and_then(RiskLevel::parse),
            assessment: value
                .get("assessment")
                .and_then(Value::as_str)
                .map_or_else(|| raw.to_string(), str::to_string),
            citations: citations_from(&value),
            parsed: true,
        },
        None => AssessmentOutput {
            risk_level: None,
            assessment: raw.to_string(),
            citations: Vec::new(),
            parsed: false,
        },
    }
}
