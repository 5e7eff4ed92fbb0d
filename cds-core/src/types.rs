//! Data types for conversations, citations, and assessment results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message written by the end user.
    User,
    /// A message produced by the pipeline.
    Assistant,
}

/// A reference to a guideline passage supporting a clinical statement.
///
/// Citations are either taken from model output (normalized, with missing
/// fields defaulted) or synthesized from the passages retrieved for the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// The source document the passage belongs to.
    #[serde(default = "Citation::default_source")]
    pub source: String,
    /// 1-based page number within the source document (0 when unknown).
    #[serde(default)]
    pub page: u32,
    /// Stable identifier of the cited chunk.
    #[serde(default = "Citation::default_chunk_id")]
    pub chunk_id: String,
    /// A short excerpt of the cited passage, bounded in length.
    #[serde(default)]
    pub excerpt: String,
}

impl Citation {
    pub(crate) fn default_source() -> String {
        "NG12 PDF".to_string()
    }

    pub(crate) fn default_chunk_id() -> String {
        "unknown".to_string()
    }
}

/// One turn of a conversation. Never mutated after being appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// The message text.
    pub content: String,
    /// Citations attached to the message (empty for user messages).
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl ChatMessage {
    /// Create a user message with no citations.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), citations: Vec::new() }
    }

    /// Create an assistant message with the given citations.
    pub fn assistant(content: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self { role: Role::Assistant, content: content.into(), citations }
    }
}

/// The closed vocabulary of assessment outcomes.
///
/// The first four levels are the only values the model is permitted to emit;
/// [`AssessmentError`](RiskLevel::AssessmentError) is a pipeline-internal
/// sentinel marking a degraded (raw-text fallback) assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Meets criteria for an urgent suspected cancer referral.
    #[serde(rename = "Urgent Referral (2-week wait)")]
    UrgentReferral,
    /// Meets criteria for urgent investigation (imaging, blood tests, ...).
    #[serde(rename = "Urgent Investigation")]
    UrgentInvestigation,
    /// Warrants further investigation without meeting urgent criteria.
    #[serde(rename = "Non-Urgent Referral")]
    NonUrgentReferral,
    /// Symptoms present but below referral thresholds.
    #[serde(rename = "Low Risk - Routine Follow-up")]
    LowRiskRoutine,
    /// Pipeline sentinel: the model response could not be interpreted.
    #[serde(rename = "Assessment Error")]
    AssessmentError,
}

impl RiskLevel {
    /// Parse the exact wire string for a risk level. Returns `None` for
    /// anything outside the fixed vocabulary, including the sentinel's own
    /// label, which the model never legitimately emits.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Urgent Referral (2-week wait)" => Some(Self::UrgentReferral),
            "Urgent Investigation" => Some(Self::UrgentInvestigation),
            "Non-Urgent Referral" => Some(Self::NonUrgentReferral),
            "Low Risk - Routine Follow-up" => Some(Self::LowRiskRoutine),
            _ => None,
        }
    }

    /// The exact wire string for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrgentReferral => "Urgent Referral (2-week wait)",
            Self::UrgentInvestigation => "Urgent Investigation",
            Self::NonUrgentReferral => "Non-Urgent Referral",
            Self::LowRiskRoutine => "Low Risk - Routine Follow-up",
            Self::AssessmentError => "Assessment Error",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of a one-shot risk assessment. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResult {
    /// The assessed patient's identifier.
    pub patient_id: String,
    /// The patient's name, resolved from the record store (never model output).
    pub patient_name: String,
    /// The assigned risk level, or the error sentinel.
    pub risk_level: RiskLevel,
    /// The clinical reasoning text (raw model text when degraded).
    pub assessment: String,
    /// Supporting citations (empty when degraded or disclaiming).
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// The outcome of one conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The session the turn was appended to.
    pub session_id: String,
    /// The answer text.
    pub answer: String,
    /// Reconciled citations for the answer.
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_round_trips_through_wire_strings() {
        for level in [
            RiskLevel::UrgentReferral,
            RiskLevel::UrgentInvestigation,
            RiskLevel::NonUrgentReferral,
            RiskLevel::LowRiskRoutine,
        ] {
            assert_eq!(RiskLevel::parse(level.as_str()), Some(level));
            let json = serde_json::to_string(&level).unwrap();
            let back: RiskLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, level);
        }
    }

    #[test]
    fn risk_level_rejects_unknown_strings() {
        assert_eq!(RiskLevel::parse("Urgent"), None);
        assert_eq!(RiskLevel::parse(""), None);
        assert_eq!(RiskLevel::parse("Assessment Error"), None);
    }

    #[test]
    fn citation_defaults_missing_fields() {
        let citation: Citation = serde_json::from_str(r#"{"page": 12}"#).unwrap();
        assert_eq!(citation.source, "NG12 PDF");
        assert_eq!(citation.page, 12);
        assert_eq!(citation.chunk_id, "unknown");
        assert_eq!(citation.excerpt, "");
    }
}
