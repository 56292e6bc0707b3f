use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DomainError, SearchResult,
};

pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k,
        }
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Whether an index has been loaded into the session.
    pub async fn is_ready(&self) -> bool {
        self.vector_store.is_loaded().await
    }

    pub async fn indexed_chunks(&self) -> Result<usize, DomainError> {
        self.vector_store.count().await
    }

    #[instrument(skip(self), fields(top_k = self.default_top_k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        if !self.vector_store.is_loaded().await {
            return Err(DomainError::not_found(
                "No index loaded. Ingest or load the document first.",
            ));
        }

        let embedding = self.embedding.embed(query).await?;
        let results = self.vector_store.search(&embedding, top_k).await?;
        tracing::debug!(hits = results.len(), "retrieved chunks");
        Ok(results)
    }
}
