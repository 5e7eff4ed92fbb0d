//! Data types for source pages, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// One page of source text, as extracted from a guideline document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number within the source document.
    pub number: u32,
    /// The raw page text.
    pub text: String,
}

impl Page {
    /// Create a page from a number and text.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self { number, text: text.into() }
    }
}

/// A contiguous, page-scoped slice of source text with a stable identifier.
///
/// Created once at ingestion and immutable afterwards; destroyed only by a
/// full re-ingestion. Re-ingesting the same source yields identical ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier encoding page and process-wide sequence,
    /// e.g. `ng12_p004_c0017`.
    pub id: String,
    /// 1-based page number the chunk was cut from.
    pub page: u32,
    /// The trimmed chunk text (never empty).
    pub text: String,
    /// The embedding vector for the chunk text (empty until embedded).
    pub embedding: Vec<f32>,
}

/// A retrieved chunk paired with its cosine distance to the query.
///
/// Distances are only meaningful within one query's result set; they are
/// never compared across queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The id of the retrieved chunk.
    pub chunk_id: String,
    /// 1-based page number of the retrieved chunk.
    pub page: u32,
    /// The chunk text.
    pub text: String,
    /// Cosine distance to the query embedding, roughly in [0, 2]
    /// (0 = identical direction).
    pub distance: f32,
}
