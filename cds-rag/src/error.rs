//! Error types for the `cds-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// An error occurred while loading source material.
    #[error("Source error: {0}")]
    SourceError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the retrieval pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// The index auto-build produced no chunks; queries cannot be served.
    #[error("Guideline index unavailable: {0}")]
    IndexUnavailable(String),
}

impl From<RagError> for cds_core::CdsError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::IndexUnavailable(msg) => cds_core::CdsError::IndexUnavailable(msg),
            RagError::EmbeddingError { provider, message } => {
                cds_core::CdsError::Upstream { service: format!("embedding ({provider})"), message }
            }
            other => cds_core::CdsError::Internal(other.to_string()),
        }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
