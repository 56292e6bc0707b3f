use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// Sentence-transformer embeddings computed in-process with ONNX Runtime.
///
/// The model is downloaded (or read from the cache) on first use, so building
/// the service is cheap and a server can start without network access.
pub struct LocalEmbedding {
    model_name: String,
    model: EmbeddingModel,
    dimension: usize,
    cache_dir: Option<PathBuf>,
    batch_size: Option<usize>,
    engine: OnceCell<Arc<Mutex<TextEmbedding>>>,
}

impl LocalEmbedding {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, DomainError> {
        Ok(Self {
            model_name: config.model.clone(),
            model: resolve_model(&config.model)?,
            dimension: config.dimension,
            cache_dir: config.cache_dir.clone(),
            batch_size: config.batch_size,
            engine: OnceCell::new(),
        })
    }

    async fn engine(&self) -> Result<Arc<Mutex<TextEmbedding>>, DomainError> {
        self.engine
            .get_or_try_init(|| async {
                let mut options =
                    InitOptions::new(self.model.clone()).with_show_download_progress(false);
                if let Some(dir) = &self.cache_dir {
                    options = options.with_cache_dir(dir.clone());
                }

                tracing::info!(model = %self.model_name, "loading embedding model");
                let loaded = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
                    .await
                    .map_err(|e| DomainError::internal(format!("model load task failed: {e}")))?
                    .map_err(|e| {
                        DomainError::external(format!(
                            "embedding model {} unavailable: {e}",
                            self.model_name
                        ))
                    })?;

                Ok(Arc::new(Mutex::new(loaded)))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl EmbeddingService for LocalEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let engine = self.engine().await?;
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let batch_size = self.batch_size;

        let vectors = tokio::task::spawn_blocking(move || {
            #[allow(unused_mut)]
            let mut model = engine
                .lock()
                .map_err(|e| DomainError::internal(format!("embedding model poisoned: {e}")))?;
            model
                .embed(owned, batch_size)
                .map_err(|e| DomainError::external(e.to_string()))
        })
        .await
        .map_err(|e| DomainError::internal(format!("embedding task failed: {e}")))??;

        vectors
            .into_iter()
            .map(|v| {
                if v.len() == self.dimension {
                    Ok(Embedding::new(v))
                } else {
                    Err(DomainError::configuration(format!(
                        "model {} produced {} dims, configured {}",
                        self.model_name,
                        v.len(),
                        self.dimension
                    )))
                }
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Maps a sentence-transformers model name onto a bundled ONNX model.
pub fn resolve_model(name: &str) -> Result<EmbeddingModel, DomainError> {
    let short = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
    match short.as_str() {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-minilm-l12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        _ => Err(DomainError::configuration(format!(
            "unsupported local embedding model: {name}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_accepts_hub_names() {
        assert!(matches!(
            resolve_model("sentence-transformers/all-MiniLM-L6-v2"),
            Ok(EmbeddingModel::AllMiniLML6V2)
        ));
        assert!(matches!(
            resolve_model("BAAI/bge-small-en-v1.5"),
            Ok(EmbeddingModel::BGESmallENV15)
        ));
        assert!(matches!(
            resolve_model("all-minilm-l12-v2"),
            Ok(EmbeddingModel::AllMiniLML12V2)
        ));
    }

    #[test]
    fn test_resolve_model_rejects_unknown() {
        assert!(matches!(
            resolve_model("text-embedding-3-small"),
            Err(DomainError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_model_load() {
        let service = LocalEmbedding::from_config(&EmbeddingConfig::default()).unwrap();
        assert!(service.embed_batch(&[]).await.unwrap().is_empty());
        assert_eq!(service.dimension(), 384);
        assert_eq!(service.model_name(), "sentence-transformers/all-MiniLM-L6-v2");
    }
}
