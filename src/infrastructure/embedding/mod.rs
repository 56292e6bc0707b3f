mod local;
mod openai;

use std::sync::Arc;

pub use local::{resolve_model, LocalEmbedding};
pub use openai::OpenAiEmbedding;

use crate::domain::{ports::EmbeddingService, DomainError};
use crate::infrastructure::config::{EmbeddingConfig, EmbeddingProvider};

/// Builds the embedding backend named in the configuration.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingService>, DomainError> {
    match config.provider {
        EmbeddingProvider::Local => Ok(Arc::new(LocalEmbedding::from_config(config)?)),
        EmbeddingProvider::OpenAi => Ok(Arc::new(OpenAiEmbedding::from_config(config))),
    }
}
