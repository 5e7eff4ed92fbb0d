//! File-persisted vector store.
//!
//! [`FileVectorStore`] keeps collections in memory for search and mirrors
//! every mutation to one JSON document per collection under a data
//! directory. Writes go to a temp file followed by a rename, and the swap
//! operation is a rename too, so a crash or concurrent reader never
//! observes a half-written collection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, RetrievalResult};
use crate::error::{RagError, Result};
use crate::inmemory::rank_by_distance;
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] persisted as JSON documents on the local filesystem.
///
/// Each collection lives at `{dir}/{name}.json` as a flat array of chunks.
/// All collections are loaded into memory on open; search runs against the
/// in-memory copy.
#[derive(Debug)]
pub struct FileVectorStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, HashMap<String, Chunk>>>,
}

impl FileVectorStore {
    /// Open (or create) a store rooted at `dir`, loading any persisted
    /// collections.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| Self::io_err(&dir, e))?;

        let mut collections = HashMap::new();
        let mut entries =
            tokio::fs::read_dir(&dir).await.map_err(|e| Self::io_err(&dir, e))?;
        while let Some(entry) =
            entries.next_entry().await.map_err(|e| Self::io_err(&dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let bytes = tokio::fs::read(&path).await.map_err(|e| Self::io_err(&path, e))?;
            let chunks: Vec<Chunk> = serde_json::from_slice(&bytes).map_err(|e| {
                RagError::VectorStoreError {
                    backend: "File".to_string(),
                    message: format!("corrupt collection file {}: {e}", path.display()),
                }
            })?;
            let map: HashMap<String, Chunk> =
                chunks.into_iter().map(|c| (c.id.clone(), c)).collect();
            tracing::debug!(collection = name, count = map.len(), "loaded persisted collection");
            collections.insert(name.to_string(), map);
        }

        Ok(Self { dir, collections: RwLock::new(collections) })
    }

    fn io_err(path: &Path, e: std::io::Error) -> RagError {
        RagError::VectorStoreError {
            backend: "File".to_string(),
            message: format!("{}: {e}", path.display()),
        }
    }

    fn missing(collection: &str) -> RagError {
        RagError::VectorStoreError {
            backend: "File".to_string(),
            message: format!("collection '{collection}' does not exist"),
        }
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write a collection to disk via temp-file-then-rename.
    async fn persist(&self, name: &str, chunks: &HashMap<String, Chunk>) -> Result<()> {
        let mut records: Vec<&Chunk> = chunks.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        let bytes = serde_json::to_vec(&records).map_err(|e| RagError::VectorStoreError {
            backend: "File".to_string(),
            message: format!("serialize collection '{name}': {e}"),
        })?;

        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        let path = self.collection_path(name);
        tokio::fs::write(&tmp, bytes).await.map_err(|e| Self::io_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| Self::io_err(&path, e))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if !collections.contains_key(name) {
            collections.insert(name.to_string(), HashMap::new());
            self.persist(name, &collections[name]).await?;
        }
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.remove(name).is_some() {
            let path = self.collection_path(name);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(Self::io_err(&path, e));
                }
            }
        }
        Ok(())
    }

    async fn swap_collection(&self, staging: &str, target: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let data = collections.remove(staging).ok_or_else(|| Self::missing(staging))?;

        let from = self.collection_path(staging);
        let to = self.collection_path(target);
        tokio::fs::rename(&from, &to).await.map_err(|e| Self::io_err(&to, e))?;

        collections.insert(target.to_string(), data);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        self.persist(collection, store).await
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
