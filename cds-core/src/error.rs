//! Error taxonomy shared across the workspace.
//!
//! Malformed model output is deliberately absent from this enum: it is
//! recovered locally by the output parser (raw-text fallback, or the
//! `Assessment Error` sentinel for assessments) and never surfaced to
//! callers as a failure.

use thiserror::Error;

/// Errors surfaced by the service boundary operations.
///
/// The variants map onto client-visible failure classes: [`NotFound`](CdsError::NotFound)
/// is a 404-equivalent, [`Validation`](CdsError::Validation) a 422-equivalent, and the
/// remaining variants 500-equivalents.
#[derive(Debug, Error)]
pub enum CdsError {
    /// The referenced patient or session does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The request shape is malformed (empty message, zero top_k, ...).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The guideline index could not be built from source material.
    /// Fatal for the request; auto-build produced zero chunks.
    #[error("Guideline index unavailable: {0}")]
    IndexUnavailable(String),

    /// An embedding or generation call failed. Never retried automatically;
    /// the upstream message is attached verbatim.
    #[error("Upstream service error ({service}): {message}")]
    Upstream {
        /// The external service that produced the error.
        service: String,
        /// The upstream failure message.
        message: String,
    },

    /// An internal failure with no more specific classification.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A convenience result type for service operations.
pub type Result<T> = std::result::Result<T, CdsError>;
