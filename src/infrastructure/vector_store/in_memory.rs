use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::{ports::VectorStore, DomainError, Embedding, IndexedChunk, SearchResult};

/// Exact cosine search over the session's chunks. Starts unloaded; queries
/// fail until an index has been loaded or built.
pub struct InMemoryVectorStore {
    chunks: RwLock<Option<Vec<IndexedChunk>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(None),
        }
    }

    pub fn with_entries(entries: Vec<IndexedChunk>) -> Self {
        Self {
            chunks: RwLock::new(Some(entries)),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn replace_all(&self, entries: Vec<IndexedChunk>) -> Result<(), DomainError> {
        let mut store = self
            .chunks
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        *store = Some(entries);
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let store = self
            .chunks
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let entries = store.as_ref().ok_or_else(|| {
            DomainError::not_found("No index loaded. Ingest or load the document first.")
        })?;

        let mut results: Vec<SearchResult> = entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: query.cosine_similarity(&entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
        });
        results.truncate(top_k);

        Ok(results)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let store = self
            .chunks
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store.as_ref().map_or(0, Vec::len))
    }

    async fn is_loaded(&self) -> bool {
        self.chunks.read().map(|s| s.is_some()).unwrap_or(false)
    }
}
