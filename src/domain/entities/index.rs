use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DocumentChunk, Embedding};
use crate::domain::{DomainError, Result};

pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Describes how a persisted index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub index_id: Uuid,
    pub format_version: u32,
    pub source_path: String,
    pub source_sha256: String,
    pub page_count: usize,
    pub chunk_count: usize,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Fails when the index was built with a different embedding model than
    /// the one that will embed queries against it.
    pub fn ensure_compatible(&self, model: &str, dimension: usize) -> Result<()> {
        if self.embedding_model != model || self.dimension != dimension {
            return Err(DomainError::configuration(format!(
                "index was built with {} ({} dims) but {} ({} dims) is configured; rebuild the index",
                self.embedding_model, self.dimension, model, dimension
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub chunk: DocumentChunk,
    pub embedding: Embedding,
}

impl IndexedChunk {
    pub fn new(chunk: DocumentChunk, embedding: Embedding) -> Self {
        Self { chunk, embedding }
    }
}

/// A complete index as persisted on disk: rebuilt wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredIndex {
    pub manifest: IndexManifest,
    pub entries: Vec<IndexedChunk>,
}

impl StoredIndex {
    /// Checks that the entries agree with the manifest.
    pub fn validate(&self) -> Result<()> {
        if self.manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(DomainError::internal(format!(
                "unsupported index format version {}",
                self.manifest.format_version
            )));
        }

        if self.entries.len() != self.manifest.chunk_count {
            return Err(DomainError::internal(format!(
                "index is corrupt: manifest lists {} chunks but {} are stored",
                self.manifest.chunk_count,
                self.entries.len()
            )));
        }

        if let Some(bad) = self
            .entries
            .iter()
            .find(|e| e.embedding.dimension() != self.manifest.dimension)
        {
            return Err(DomainError::internal(format!(
                "index is corrupt: chunk {} has {} dims, expected {}",
                bad.chunk.chunk_index,
                bad.embedding.dimension(),
                self.manifest.dimension
            )));
        }

        Ok(())
    }
}
