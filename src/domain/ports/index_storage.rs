use async_trait::async_trait;

use crate::domain::{errors::DomainError, IndexManifest, StoredIndex};

/// Persistence of a whole index as one opaque artifact.
#[async_trait]
pub trait IndexStorage: Send + Sync {
    async fn exists(&self) -> bool;
    async fn read_manifest(&self) -> Result<IndexManifest, DomainError>;
    async fn load(&self) -> Result<StoredIndex, DomainError>;
    /// Replaces any previously stored index in full.
    async fn save(&self, index: &StoredIndex) -> Result<(), DomainError>;
    fn location(&self) -> String;
}
