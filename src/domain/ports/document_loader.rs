use std::path::Path;

use async_trait::async_trait;

use crate::domain::{errors::DomainError, Page};

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Extracts the raw text of every page, in page order.
    async fn load_pages(&self, path: &Path) -> Result<Vec<Page>, DomainError>;
}
