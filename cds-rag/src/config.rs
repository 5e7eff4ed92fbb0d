//! Configuration for the retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default cosine-distance cutoff below which evidence counts as adequate.
pub const DEFAULT_EVIDENCE_THRESHOLD: f32 = 1.2;

/// Default logical collection name for the guideline index.
pub const DEFAULT_COLLECTION: &str = "ng12_guidelines";

/// Configuration parameters for retrieval.
///
/// Chunk sizes are expressed in approximate tokens (about 4 characters each).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in tokens.
    pub chunk_tokens: usize,
    /// Overlap between consecutive chunks in tokens.
    pub overlap_tokens: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Cosine-distance cutoff for the evidence gate (strictly-less-than).
    pub evidence_threshold: f32,
    /// Logical collection name in the vector store.
    pub collection: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: 500,
            overlap_tokens: 100,
            top_k: 5,
            evidence_threshold: DEFAULT_EVIDENCE_THRESHOLD,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in tokens.
    pub fn chunk_tokens(mut self, tokens: usize) -> Self {
        self.config.chunk_tokens = tokens;
        self
    }

    /// Set the overlap between consecutive chunks in tokens.
    pub fn overlap_tokens(mut self, tokens: usize) -> Self {
        self.config.overlap_tokens = tokens;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the evidence-gate distance threshold.
    pub fn evidence_threshold(mut self, threshold: f32) -> Self {
        self.config.evidence_threshold = threshold;
        self
    }

    /// Set the logical collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `overlap_tokens >= chunk_tokens`
    /// - `top_k == 0`
    /// - `evidence_threshold` is not a positive finite number
    pub fn build(self) -> Result<RagConfig> {
        if self.config.overlap_tokens >= self.config.chunk_tokens {
            return Err(RagError::ConfigError(format!(
                "overlap_tokens ({}) must be less than chunk_tokens ({})",
                self.config.overlap_tokens, self.config.chunk_tokens
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if !self.config.evidence_threshold.is_finite() || self.config.evidence_threshold <= 0.0 {
            return Err(RagError::ConfigError(
                "evidence_threshold must be a positive finite number".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
    }

    #[test]
    fn overlap_must_be_less_than_size() {
        let err = RagConfig::builder().chunk_tokens(100).overlap_tokens(100).build();
        assert!(matches!(err, Err(RagError::ConfigError(_))));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let err = RagConfig::builder().top_k(0).build();
        assert!(matches!(err, Err(RagError::ConfigError(_))));
    }
}
