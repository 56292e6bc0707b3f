use crate::domain::{errors::DomainError, Embedding, IndexedChunk, SearchResult};
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replaces the whole contents and marks the store as loaded.
    async fn replace_all(&self, entries: Vec<IndexedChunk>) -> Result<(), DomainError>;
    /// Fails with `NotFound` while nothing has been loaded.
    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn is_loaded(&self) -> bool;
}
