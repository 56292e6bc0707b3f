use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    ports::IndexStorage, DomainError, IndexManifest, IndexedChunk, StoredIndex,
};

const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "chunks.json";

/// Keeps the index in one directory: `manifest.json` describing the build
/// and `chunks.json` holding every chunk with its embedding.
///
/// Saving writes a staging directory next to the target and swaps it in, so
/// readers never observe a half-written index.
#[derive(Debug, Clone)]
pub struct DirectoryIndexStorage {
    dir: PathBuf,
}

impl DirectoryIndexStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sibling(&self, tag: &str) -> Result<PathBuf, DomainError> {
        let name = self.dir.file_name().ok_or_else(|| {
            DomainError::configuration(format!(
                "index directory {} has no final path component",
                self.dir.display()
            ))
        })?;
        let mut sibling = name.to_os_string();
        sibling.push(format!(".{tag}-{}", Uuid::new_v4().simple()));
        Ok(self.dir.with_file_name(sibling))
    }

    fn missing(&self) -> DomainError {
        DomainError::not_found(format!(
            "Index not found at {}. Please ingest the document first.",
            self.dir.display()
        ))
    }
}

#[async_trait]
impl IndexStorage for DirectoryIndexStorage {
    async fn exists(&self) -> bool {
        tokio::fs::try_exists(self.dir.join(MANIFEST_FILE))
            .await
            .unwrap_or(false)
    }

    async fn read_manifest(&self) -> Result<IndexManifest, DomainError> {
        if !self.exists().await {
            return Err(self.missing());
        }

        let raw = tokio::fs::read(self.dir.join(MANIFEST_FILE)).await?;
        serde_json::from_slice(&raw)
            .map_err(|e| DomainError::internal(format!("corrupt index manifest: {e}")))
    }

    async fn load(&self) -> Result<StoredIndex, DomainError> {
        let manifest = self.read_manifest().await?;

        let raw = tokio::fs::read(self.dir.join(ENTRIES_FILE))
            .await
            .map_err(|e| DomainError::internal(format!("index entries unreadable: {e}")))?;
        let entries: Vec<IndexedChunk> = serde_json::from_slice(&raw)
            .map_err(|e| DomainError::internal(format!("corrupt index entries: {e}")))?;

        let index = StoredIndex { manifest, entries };
        index.validate()?;

        tracing::debug!(dir = %self.dir.display(), chunks = index.entries.len(), "index loaded");
        Ok(index)
    }

    async fn save(&self, index: &StoredIndex) -> Result<(), DomainError> {
        index.validate()?;

        let manifest = serde_json::to_vec_pretty(&index.manifest)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let entries = serde_json::to_vec(&index.entries)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        if let Some(parent) = self.dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = self.sibling("staging")?;
        tokio::fs::create_dir_all(&staging).await?;
        tokio::fs::write(staging.join(ENTRIES_FILE), entries).await?;
        tokio::fs::write(staging.join(MANIFEST_FILE), manifest).await?;

        let previous = if tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            let backup = self.sibling("previous")?;
            tokio::fs::rename(&self.dir, &backup).await?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = tokio::fs::rename(&staging, &self.dir).await {
            if let Some(backup) = &previous {
                let _ = tokio::fs::rename(backup, &self.dir).await;
            }
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(DomainError::internal(format!(
                "failed to move index into {}: {e}",
                self.dir.display()
            )));
        }

        if let Some(backup) = previous {
            if let Err(e) = tokio::fs::remove_dir_all(&backup).await {
                tracing::warn!(path = %backup.display(), error = %e, "could not remove previous index");
            }
        }

        tracing::info!(
            dir = %self.dir.display(),
            chunks = index.entries.len(),
            index_id = %index.manifest.index_id,
            "index saved"
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
