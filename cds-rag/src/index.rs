//! The guideline index: a named collection that builds itself from source
//! documents the first time it is queried empty.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::chunking::PageChunker;
use crate::document::RetrievalResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::source::SourceLoader;
use crate::vectorstore::VectorStore;

/// Number of chunks embedded per upstream batch call during ingestion.
const EMBED_BATCH_SIZE: usize = 20;

/// A persistent nearest-neighbor index over chunked guideline text.
///
/// The index is lazy: the first query that observes an empty collection runs
/// the full ingestion (load → chunk → embed → store) exactly once, inline.
/// Concurrent first queries do not double-build; later queries reuse the
/// built collection. If ingestion finds no source material the index stays
/// unavailable and every query fails with [`RagError::IndexUnavailable`]
/// rather than silently returning empty results.
pub struct GuidelineIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    loader: Arc<dyn SourceLoader>,
    chunker: PageChunker,
    collection: String,
    init: OnceCell<()>,
}

impl GuidelineIndex {
    /// Create an index over the given backend, embedder, and source loader.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        loader: Arc<dyn SourceLoader>,
        chunker: PageChunker,
        collection: impl Into<String>,
    ) -> Self {
        Self { store, embedder, loader, chunker, collection: collection.into(), init: OnceCell::new() }
    }

    /// The logical collection name this index serves.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of chunks currently in the collection.
    pub async fn count(&self) -> Result<usize> {
        self.store.count(&self.collection).await
    }

    /// Full idempotent re-ingestion: load pages, chunk, embed, and replace
    /// the collection. The replacement is staged and swapped in, so a
    /// concurrent reader observes either the old or the new collection.
    ///
    /// Returns the number of chunks stored. Rebuilding from identical source
    /// input produces identical chunk ids and counts.
    pub async fn rebuild(&self) -> Result<usize> {
        let pages = self.loader.load_pages()?;
        let chunks = self.chunker.chunk_pages(&pages);
        info!(pages = pages.len(), chunks = chunks.len(), "ingesting source material");

        let mut embedded = chunks;
        for batch in embedded.chunks_mut(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(error = %e, "embedding failed during ingestion");
                e
            })?;
            for (chunk, vector) in batch.iter_mut().zip(vectors) {
                chunk.embedding = vector;
            }
        }

        // Stage the replacement, then swap: the old collection is replaced
        // in one step and readers never see a partial index.
        let staging = format!("{}__staging", self.collection);
        self.store.delete_collection(&staging).await?;
        self.store.create_collection(&staging).await?;
        self.store.upsert(&staging, &embedded).await?;
        self.store.swap_collection(&staging, &self.collection).await?;

        info!(collection = %self.collection, chunks = embedded.len(), "index rebuilt");
        Ok(embedded.len())
    }

    /// Run the lazy auto-build at most once across concurrent callers.
    ///
    /// Upstream failures (embedding, storage) are not cached; the next query
    /// re-attempts the build. A successful build that produced zero chunks
    /// IS cached: the collection simply stays empty and queries fail with
    /// a distinct unavailability error.
    async fn ensure_built(&self) -> Result<()> {
        self.init
            .get_or_try_init(|| async {
                if self.store.count(&self.collection).await? == 0 {
                    info!(collection = %self.collection, "index empty or missing, starting ingestion");
                    self.rebuild().await?;
                }
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Return up to `top_k` chunks nearest to the query embedding, ordered
    /// by ascending cosine distance.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexUnavailable`] when the collection is empty
    /// after the one-shot auto-build (no source material was found).
    pub async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<RetrievalResult>> {
        self.ensure_built().await?;

        if self.store.count(&self.collection).await? == 0 {
            return Err(RagError::IndexUnavailable(format!(
                "collection '{}' has no chunks; no source material was ingested",
                self.collection
            )));
        }

        self.store.search(&self.collection, embedding, top_k).await
    }
}
