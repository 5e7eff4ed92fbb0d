//! Evidence sufficiency gate.

use crate::config::DEFAULT_EVIDENCE_THRESHOLD;
use crate::document::RetrievalResult;

/// Decides whether a retrieval result set is strong enough to ground
/// generation.
///
/// Evidence is adequate iff the result set is non-empty and the minimum
/// distance is strictly below the threshold. The threshold is a single
/// global constant, not calibrated per query.
#[derive(Debug, Clone, Copy)]
pub struct EvidenceGate {
    threshold: f32,
}

impl EvidenceGate {
    /// Create a gate with the given distance threshold.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// The configured distance threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Minimum distance in the result set, if any.
    pub fn min_distance(results: &[RetrievalResult]) -> Option<f32> {
        results.iter().map(|r| r.distance).min_by(|a, b| a.total_cmp(b))
    }

    /// Whether the result set constitutes adequate evidence.
    pub fn adequate(&self, results: &[RetrievalResult]) -> bool {
        Self::min_distance(results).is_some_and(|min| min < self.threshold)
    }
}

impl Default for EvidenceGate {
    fn default() -> Self {
        Self::new(DEFAULT_EVIDENCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(distance: f32) -> RetrievalResult {
        RetrievalResult {
            chunk_id: "ng12_p001_c0000".to_string(),
            page: 1,
            text: "passage".to_string(),
            distance,
        }
    }

    #[test]
    fn empty_result_set_is_inadequate() {
        assert!(!EvidenceGate::default().adequate(&[]));
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let gate = EvidenceGate::default();
        assert!(gate.adequate(&[result(1.19)]));
        assert!(!gate.adequate(&[result(1.2)]));
    }

    #[test]
    fn minimum_distance_governs_mixed_sets() {
        let gate = EvidenceGate::default();
        assert!(gate.adequate(&[result(1.5), result(0.8), result(1.9)]));
        assert!(!gate.adequate(&[result(1.5), result(1.7)]));
    }
}
