use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel;
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Hosted embeddings through the OpenAI API.
pub struct OpenAiEmbedding {
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    pub fn new() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }

    fn client(&self) -> Result<openai::Client, DomainError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(openai::Client::from_env()),
            _ => Err(DomainError::configuration(format!(
                "{API_KEY_ENV} not found. Please set it in .env file or environment."
            ))),
        }
    }

    fn to_embedding(&self, vec: Vec<f64>) -> Result<Embedding, DomainError> {
        if vec.len() != self.dimension {
            return Err(DomainError::configuration(format!(
                "model {} produced {} dims, configured {}",
                self.model,
                vec.len(),
                self.dimension
            )));
        }
        Ok(Embedding::new(vec.into_iter().map(|x| x as f32).collect()))
    }
}

impl Default for OpenAiEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
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

        let client = self.client()?;
        let model = client.embedding_model(&self.model);

        embed_in_order(&model, texts)
            .await?
            .into_iter()
            .map(|emb| self.to_embedding(emb.vec))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Embeds `texts` in request-sized batches. The i-th vector returned belongs
/// to the i-th text.
async fn embed_in_order<M: EmbeddingModel>(
    model: &M,
    texts: &[&str],
) -> Result<Vec<rig::embeddings::Embedding>, DomainError> {
    let mut out = Vec::with_capacity(texts.len());

    for batch in texts.chunks(M::MAX_DOCUMENTS.max(1)) {
        let owned: Vec<String> = batch.iter().map(|t| t.to_string()).collect();
        let embedded = model
            .embed_texts(owned)
            .await
            .map_err(|e| DomainError::external(e.to_string()))?;

        if embedded.len() != batch.len() {
            return Err(DomainError::external(format!(
                "embedding API returned {} vectors for {} texts",
                embedded.len(),
                batch.len()
            )));
        }
        out.extend(embedded);
    }

    Ok(out)
}
