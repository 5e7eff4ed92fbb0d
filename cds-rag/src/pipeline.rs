//! Retrieval pipeline orchestrator.
//!
//! [`RetrievalPipeline`] composes an [`EmbeddingProvider`], a
//! [`GuidelineIndex`], and an [`EvidenceGate`]: it embeds query text, runs
//! the nearest-neighbor search, and exposes the gate verdict the caller uses
//! to decide whether generation may proceed.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::RetrievalResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::gate::EvidenceGate;
use crate::index::GuidelineIndex;

/// Build the descriptive query string for a symptom-term search.
pub fn symptom_query(symptoms: &[String]) -> String {
    format!("Cancer referral guidelines for symptoms: {}", symptoms.join(", "))
}

/// The retrieval pipeline: embed → search → gate.
///
/// Construct one via [`RetrievalPipeline::builder()`].
pub struct RetrievalPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<GuidelineIndex>,
    gate: EvidenceGate,
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The evidence gate used to judge result sets.
    pub fn gate(&self) -> &EvidenceGate {
        &self.gate
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<GuidelineIndex> {
        &self.index
    }

    /// Retrieve the passages nearest to a free-text query.
    ///
    /// `top_k` overrides the configured default when given. Results are
    /// ordered by ascending distance.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Vec<RetrievalResult>> {
        let k = top_k.unwrap_or(self.config.top_k);

        let embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;

        let results = self.index.query(&embedding, k).await?;
        info!(result_count = results.len(), top_k = k, "retrieval completed");
        Ok(results)
    }

    /// Retrieve passages for a list of symptom terms, using the fixed
    /// descriptive query template.
    pub async fn retrieve_for_symptoms(
        &self,
        symptoms: &[String],
        top_k: Option<usize>,
    ) -> Result<Vec<RetrievalResult>> {
        self.retrieve(&symptom_query(symptoms), top_k).await
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// All fields except `gate` are required; the gate defaults to the
/// configured evidence threshold.
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<GuidelineIndex>>,
}

impl RetrievalPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the guideline index.
    pub fn index(mut self, index: Arc<GuidelineIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Build the [`RetrievalPipeline`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RetrievalPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::ConfigError("embedder is required".to_string()))?;
        let index =
            self.index.ok_or_else(|| RagError::ConfigError("index is required".to_string()))?;

        let gate = EvidenceGate::new(config.evidence_threshold);
        Ok(RetrievalPipeline { config, embedder, index, gate })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symptom_query_uses_fixed_template() {
        let symptoms = vec!["unexplained hemoptysis".to_string(), "persistent cough".to_string()];
        assert_eq!(
            symptom_query(&symptoms),
            "Cancer referral guidelines for symptoms: unexplained hemoptysis, persistent cough"
        );
    }

    #[test]
    fn builder_requires_all_parts() {
        let err = RetrievalPipeline::builder().config(RagConfig::default()).build();
        assert!(matches!(err, Err(RagError::ConfigError(_))));
    }
}
