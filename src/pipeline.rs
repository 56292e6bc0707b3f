//! Wires configured adapters into the application services.

use std::path::Path;
use std::sync::Arc;

use crate::application::{IngestService, QaService, RagService};
use crate::domain::{
    ports::{DocumentLoader, EmbeddingService, IndexStorage, LlmService, VectorStore},
    prompt::PromptTemplate,
    text::TextSplitter,
    DomainError,
};
use crate::infrastructure::{
    config::Config, embedding, AppConfig, DirectoryIndexStorage, HostedLlm, InMemoryVectorStore,
    PdfLoader,
};

/// The concrete implementations behind each port.
pub struct Adapters {
    pub loader: Arc<dyn DocumentLoader>,
    pub embedding: Arc<dyn EmbeddingService>,
    pub storage: Arc<dyn IndexStorage>,
    pub vector_store: Arc<dyn VectorStore>,
    pub llm: Arc<dyn LlmService>,
}

impl Adapters {
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        Ok(Self {
            loader: Arc::new(PdfLoader::new()),
            embedding: embedding::from_config(&config.embedding)?,
            storage: Arc::new(DirectoryIndexStorage::new(&config.index.dir)),
            vector_store: Arc::new(InMemoryVectorStore::new()),
            llm: Arc::new(HostedLlm::from_config(&config.llm)),
        })
    }
}

#[derive(Clone)]
pub struct Pipeline {
    pub config: Arc<AppConfig>,
    pub ingest: Arc<IngestService>,
    pub qa: Arc<QaService>,
    pub llm: Arc<dyn LlmService>,
}

impl Pipeline {
    pub fn from_config(config: AppConfig) -> Result<Self, DomainError> {
        let adapters = Adapters::from_config(&config.config)?;
        Self::new(config, adapters)
    }

    pub fn new(config: AppConfig, adapters: Adapters) -> Result<Self, DomainError> {
        let c = &config.config;
        let splitter = TextSplitter::new(c.chunking.chunk_size, c.chunking.chunk_overlap)?;

        let ingest = IngestService::new(
            adapters.loader,
            adapters.embedding.clone(),
            adapters.storage,
            adapters.vector_store.clone(),
        )
        .with_splitter(splitter);

        let rag = Arc::new(RagService::new(
            adapters.embedding,
            adapters.vector_store,
            c.retrieval.top_k,
        ));

        let answer = &config.prompts.answer;
        let qa = QaService::new(
            rag,
            adapters.llm.clone(),
            PromptTemplate::new(answer.template.as_str()),
        )?
        .with_system_prompt(answer.system.clone())
        .with_title(c.document.title.as_str());

        Ok(Self {
            ingest: Arc::new(ingest),
            qa: Arc::new(qa),
            llm: adapters.llm,
            config: Arc::new(config),
        })
    }

    /// The configured source PDF.
    pub fn pdf_path(&self) -> &Path {
        &self.config.config.document.pdf_path
    }
}
