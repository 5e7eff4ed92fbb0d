//! Vector store trait for persisting embedded chunks and nearest-neighbor search.

use async_trait::async_trait;

use crate::document::{Chunk, RetrievalResult};
use crate::error::Result;

/// A storage backend for embedded chunks with cosine-distance search.
///
/// Implementations manage named collections of [`Chunk`]s. Each record
/// carries the page number and chunk id as metadata alongside the raw text
/// and its embedding vector; search returns results ordered by ascending
/// cosine distance.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str) -> Result<()>;

    /// Delete a named collection and all its data. No-op if absent.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Atomically replace `target` with the contents of `staging`, removing
    /// `staging`. Readers observe either the old or the new collection,
    /// never a mixture.
    async fn swap_collection(&self, staging: &str, target: &str) -> Result<()>;

    /// Insert or overwrite chunks in a collection. Chunks must have
    /// embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Number of chunks stored in a collection; 0 if the collection is absent.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Return up to `top_k` chunks nearest to `embedding`, ordered by
    /// ascending cosine distance. Returns fewer than `top_k` results when
    /// the collection holds fewer chunks.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>>;
}
