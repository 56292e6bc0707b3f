#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use report_qa::domain::{
    ports::{DocumentLoader, EmbeddingService, LlmService},
    DomainError, Embedding, Page,
};
use report_qa::infrastructure::{AppConfig, DirectoryIndexStorage, InMemoryVectorStore};
use report_qa::{Adapters, Pipeline};

pub const DIMENSION: usize = 256;

/// Serves fixed pages regardless of the file it is pointed at.
pub struct StubLoader {
    pages: Mutex<Vec<Page>>,
    failure: Mutex<Option<String>>,
}

impl StubLoader {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages: Mutex::new(pages),
            failure: Mutex::new(None),
        }
    }

    pub fn set_pages(&self, pages: Vec<Page>) {
        *self.pages.lock().unwrap() = pages;
    }

    /// Makes every later load fail with `ExternalService`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl DocumentLoader for StubLoader {
    async fn load_pages(&self, _path: &Path) -> Result<Vec<Page>, DomainError> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(DomainError::external(message));
        }
        Ok(self.pages.lock().unwrap().clone())
    }
}

/// Bag-of-words hashing so texts sharing words land close together.
pub struct HashEmbedding;

impl HashEmbedding {
    fn vector(text: &str) -> Embedding {
        let mut v = vec![0.0f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }
        Embedding::new(v)
    }
}

#[async_trait]
impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "hash-bow"
    }
}

/// Records every prompt and answers with a canned reply.
pub struct RecordingLlm {
    credential: bool,
    prompts: Mutex<Vec<String>>,
}

impl RecordingLlm {
    pub fn new(credential: bool) -> Self {
        Self {
            credential,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for RecordingLlm {
    fn check_credentials(&self) -> Result<(), DomainError> {
        if self.credential {
            Ok(())
        } else {
            Err(DomainError::configuration("GROQ_API_KEY not found"))
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Revenue grew strongly.".to_string())
    }

    async fn complete_with_system(
        &self,
        _system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.complete(prompt).await
    }
}

pub fn report_pages() -> Vec<Page> {
    let revenue = "Revenue from operations grew 45 percent year on year, driven by food delivery \
                   and quick commerce. Gross order value rose across every city we serve. "
        .repeat(6);
    let risks = "Key risks include intense competition, regulatory change, and dependence on \
                 delivery partners. Cyber security incidents could disrupt operations. "
        .repeat(6);
    vec![
        Page::new(1, "Annual Report 2024\n\n1"),
        Page::new(2, revenue),
        Page::new(3, risks),
        Page::new(4, ""),
        Page::new(5, "The company operates in more than 600 cities across India."),
    ]
}

pub struct Harness {
    pub dir: TempDir,
    pub loader: Arc<StubLoader>,
    pub llm: Arc<RecordingLlm>,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_credential(true)
    }

    pub fn with_credential(credential: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("report.pdf");
        std::fs::write(&pdf, b"%PDF-1.4 stub").unwrap();

        let mut config = AppConfig::default();
        config.config.document.pdf_path = pdf;
        config.config.index.dir = dir.path().join("vector_index");
        config.config.server.upload_dir = dir.path().join("uploads");
        config.prompts.examples = vec!["What are the key risks?".to_string()];

        let loader = Arc::new(StubLoader::new(report_pages()));
        let llm = Arc::new(RecordingLlm::new(credential));

        let adapters = Adapters {
            loader: loader.clone(),
            embedding: Arc::new(HashEmbedding),
            storage: Arc::new(DirectoryIndexStorage::new(&config.config.index.dir)),
            vector_store: Arc::new(InMemoryVectorStore::new()),
            llm: llm.clone(),
        };
        let pipeline = Pipeline::new(config, adapters).unwrap();

        Self {
            dir,
            loader,
            llm,
            pipeline,
        }
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.pipeline.pdf_path().to_path_buf()
    }

    pub fn index_dir(&self) -> PathBuf {
        self.pipeline.config.config.index.dir.clone()
    }
}
