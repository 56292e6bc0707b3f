use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    ports::{DocumentLoader, EmbeddingService, IndexStorage, VectorStore},
    text::{clean_text, TextSplitter},
    DomainError, IndexManifest, IndexedChunk, Page, StoredIndex, INDEX_FORMAT_VERSION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    /// An existing index was reused as-is.
    Loaded,
    /// The index was rebuilt from the PDF and persisted.
    Built,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    pub manifest: IndexManifest,
}

/// Turns the source PDF into a persisted index and makes it the session's
/// searchable index.
pub struct IngestService {
    loader: Arc<dyn DocumentLoader>,
    embedding: Arc<dyn EmbeddingService>,
    storage: Arc<dyn IndexStorage>,
    vector_store: Arc<dyn VectorStore>,
    splitter: TextSplitter,
}

impl IngestService {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embedding: Arc<dyn EmbeddingService>,
        storage: Arc<dyn IndexStorage>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            loader,
            embedding,
            storage,
            vector_store,
            splitter: TextSplitter::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Reuses the persisted index unless `force_rebuild` is set or none
    /// exists; otherwise extracts, chunks and embeds the PDF and replaces the
    /// persisted index wholesale.
    #[instrument(skip(self), fields(pdf = %pdf_path.display()))]
    pub async fn build_index(
        &self,
        pdf_path: &Path,
        force_rebuild: bool,
    ) -> Result<IngestReport, DomainError> {
        if !force_rebuild && self.storage.exists().await {
            tracing::info!(location = %self.storage.location(), "loading existing index");
            let report = self.load_index().await?;
            self.warn_if_stale(pdf_path, &report.manifest).await;
            return Ok(report);
        }

        self.rebuild(pdf_path).await
    }

    /// Loads the persisted index into the session without touching the PDF.
    #[instrument(skip(self))]
    pub async fn load_index(&self) -> Result<IngestReport, DomainError> {
        let index = self.storage.load().await?;
        index
            .manifest
            .ensure_compatible(self.embedding.model_name(), self.embedding.dimension())?;

        let manifest = index.manifest.clone();
        self.vector_store.replace_all(index.entries).await?;

        tracing::info!(
            chunks = manifest.chunk_count,
            index_id = %manifest.index_id,
            "index ready"
        );
        Ok(IngestReport {
            outcome: IngestOutcome::Loaded,
            manifest,
        })
    }

    /// Manifest of the persisted index, if any.
    pub async fn manifest(&self) -> Result<Option<IndexManifest>, DomainError> {
        if !self.storage.exists().await {
            return Ok(None);
        }
        self.storage.read_manifest().await.map(Some)
    }

    async fn rebuild(&self, pdf_path: &Path) -> Result<IngestReport, DomainError> {
        let bytes = read_source(pdf_path).await?;
        let fingerprint = fingerprint(&bytes);
        drop(bytes);

        let pages = self.loader.load_pages(pdf_path).await?;
        let page_count = pages.len();

        let cleaned: Vec<Page> = pages
            .into_iter()
            .map(|p| Page::new(p.number, clean_text(&p.text)))
            .filter(|p| !p.text.is_empty())
            .collect();
        tracing::info!(pages = page_count, with_text = cleaned.len(), "extracted text");

        let source = pdf_path.display().to_string();
        let chunks = self.splitter.split_pages(&cleaned, &source);
        tracing::info!(chunks = chunks.len(), "created chunks");

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "embedding backend returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let entries: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk::new(chunk, embedding))
            .collect();

        let index = StoredIndex {
            manifest: IndexManifest {
                index_id: Uuid::new_v4(),
                format_version: INDEX_FORMAT_VERSION,
                source_path: source,
                source_sha256: fingerprint,
                page_count,
                chunk_count: entries.len(),
                embedding_model: self.embedding.model_name().to_string(),
                dimension: self.embedding.dimension(),
                chunk_size: self.splitter.chunk_size(),
                chunk_overlap: self.splitter.chunk_overlap(),
                built_at: Utc::now(),
            },
            entries,
        };

        self.storage.save(&index).await?;

        let StoredIndex { manifest, entries } = index;
        self.vector_store.replace_all(entries).await?;

        tracing::info!(
            chunks = manifest.chunk_count,
            index_id = %manifest.index_id,
            location = %self.storage.location(),
            "index built"
        );
        Ok(IngestReport {
            outcome: IngestOutcome::Built,
            manifest,
        })
    }

    async fn warn_if_stale(&self, pdf_path: &Path, manifest: &IndexManifest) {
        match tokio::fs::read(pdf_path).await {
            Ok(bytes) if fingerprint(&bytes) != manifest.source_sha256 => {
                tracing::warn!(
                    pdf = %pdf_path.display(),
                    built_from = %manifest.source_path,
                    "source PDF differs from the indexed one; force a rebuild to refresh the index"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "source PDF not readable, skipping staleness check"),
        }
    }
}

async fn read_source(path: &Path) -> Result<Vec<u8>, DomainError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            DomainError::not_found(format!("PDF file not found: {}", path.display()))
        }
        _ => DomainError::from(e),
    })
}

fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
