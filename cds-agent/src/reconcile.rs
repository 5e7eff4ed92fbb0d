//! Citation reconciliation against the turn's retrieved evidence.

use cds_core::Citation;
use cds_rag::RetrievalResult;

use crate::classify::DisclaimerClassifier;

/// Maximum number of citations synthesized from retrieved passages.
const BACKFILL_LIMIT: usize = 3;

/// Character budget for synthesized excerpts.
const EXCERPT_CHARS: usize = 200;

/// Enforces the citation invariants after parsing:
///
/// 1. A disclaimer answer carries no citations, even if the model supplied
///    some; the two are contradictory.
/// 2. An answer with adequate evidence but no model citations gets up to
///    [`BACKFILL_LIMIT`] citations synthesized from the retrieved passages,
///    in rank order.
/// 3. Otherwise model citations pass through as supplied (already
///    normalized by the parser).
///
/// Model-supplied chunk ids are deliberately not validated against the
/// turn's retrieval set; only the *absence* of citations is corrected.
#[derive(Debug, Clone, Default)]
pub struct CitationReconciler {
    disclaimer: DisclaimerClassifier,
}

impl CitationReconciler {
    /// Create a reconciler with the default disclaimer classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the disclaimer classifier (for tuning phrase sets in tests).
    pub fn with_disclaimer(mut self, disclaimer: DisclaimerClassifier) -> Self {
        self.disclaimer = disclaimer;
        self
    }

    /// Reconcile citations for an answer or assessment.
    ///
    /// `retrieved` is the turn's retrieval set when the evidence gate judged
    /// it adequate; pass `None` where no gate verdict exists (assessments)
    /// to disable back-fill.
    pub fn reconcile(
        &self,
        text: &str,
        model_citations: Vec<Citation>,
        retrieved: Option<&[RetrievalResult]>,
    ) -> Vec<Citation> {
        if self.disclaimer.is_disclaimer(text) {
            return Vec::new();
        }
        if model_citations.is_empty() {
            if let Some(results) = retrieved {
                return self.from_results(results);
            }
        }
        model_citations
    }

    /// Synthesize citations from retrieved passages, in rank order.
    pub fn from_results(&self, results: &[RetrievalResult]) -> Vec<Citation> {
        results
            .iter()
            .take(BACKFILL_LIMIT)
            .map(|r| Citation {
                source: "NG12 PDF".to_string(),
                page: r.page,
                chunk_id: r.chunk_id.clone(),
                excerpt: truncate_excerpt(&r.text),
            })
            .collect()
    }
}

/// Bound excerpt text to the character budget, marking truncation.
fn truncate_excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        let cut: String = text.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
