//! In-memory vector store using cosine distance.
//!
//! [`InMemoryVectorStore`] is a zero-dependency backend backed by a `HashMap`
//! protected by a `tokio::sync::RwLock`, suitable for tests and small
//! deployments that rebuild the index on startup.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, RetrievalResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// An in-memory vector store using cosine distance for search.
///
/// Collections are stored as nested `HashMap`s: collection name → chunk id →
/// chunk. The swap operation moves a whole staging map under a single write
/// lock, so readers never observe a partially-rebuilt collection.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, Chunk>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing(collection: &str) -> RagError {
        RagError::VectorStoreError {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine distance in [0, 2]: `1 − cosine similarity`.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Rank chunks by ascending cosine distance to the query and keep the top k.
pub(crate) fn rank_by_distance(
    chunks: impl Iterator<Item = Chunk>,
    embedding: &[f32],
    top_k: usize,
) -> Vec<RetrievalResult> {
    let mut scored: Vec<RetrievalResult> = chunks
        .map(|chunk| RetrievalResult {
            distance: cosine_distance(&chunk.embedding, embedding),
            chunk_id: chunk.id,
            page: chunk.page,
            text: chunk.text,
        })
        .collect();

    scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn swap_collection(&self, staging: &str, target: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let data = collections.remove(staging).ok_or_else(|| Self::missing(staging))?;
        collections.insert(target.to_string(), data);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, HashMap::len))
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::missing(collection))?;
        Ok(rank_by_distance(store.values().cloned(), embedding, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, page: u32, embedding: Vec<f32>) -> Chunk {
        Chunk { id: id.to_string(), page, text: format!("text for {id}"), embedding }
    }

    #[tokio::test]
    async fn search_orders_by_ascending_distance() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs").await.unwrap();
        store
            .upsert(
                "docs",
                &[
                    chunk("far", 1, vec![0.0, 1.0]),
                    chunk("near", 2, vec![1.0, 0.0]),
                    chunk("opposite", 3, vec![-1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let results = store.search("docs", &[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
        assert_eq!(ids, ["near", "far", "opposite"]);
        assert!(results[0].distance < 1e-6);
        assert!((results[1].distance - 1.0).abs() < 1e-6);
        assert!((results[2].distance - 2.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_returns_all_when_fewer_than_top_k() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs").await.unwrap();
        store.upsert("docs", &[chunk("only", 1, vec![1.0, 0.0])]).await.unwrap();

        let results = store.search("docs", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn swap_replaces_target_and_removes_staging() {
        let store = InMemoryVectorStore::new();
        store.create_collection("docs").await.unwrap();
        store.upsert("docs", &[chunk("old", 1, vec![1.0, 0.0])]).await.unwrap();

        store.create_collection("docs__staging").await.unwrap();
        store
            .upsert(
                "docs__staging",
                &[chunk("new_a", 1, vec![1.0, 0.0]), chunk("new_b", 2, vec![0.0, 1.0])],
            )
            .await
            .unwrap();
        store.swap_collection("docs__staging", "docs").await.unwrap();

        assert_eq!(store.count("docs").await.unwrap(), 2);
        assert_eq!(store.count("docs__staging").await.unwrap(), 0);
        let results = store.search("docs", &[1.0, 0.0], 5).await.unwrap();
        assert!(results.iter().all(|r| r.chunk_id.starts_with("new_")));
    }

    #[tokio::test]
    async fn count_is_zero_for_absent_collection() {
        let store = InMemoryVectorStore::new();
        assert_eq!(store.count("nope").await.unwrap(), 0);
    }
}
