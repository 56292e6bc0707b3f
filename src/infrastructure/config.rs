use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::text::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Loads the YAML configuration and prompts, then applies environment
    /// overrides. Missing default files fall back to built-in defaults; an
    /// explicitly given `config_path` must exist.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: Config = match config_path {
            Some(path) => read_yaml(path)?,
            None => read_yaml_if_exists(Path::new(DEFAULT_CONFIG_PATH))?.unwrap_or_default(),
        };

        let prompts_path = config
            .prompts_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_PATH));
        let prompts = read_yaml_if_exists(&prompts_path)?.unwrap_or_default();

        config.apply_env_overrides()?;

        let app = Self { config, prompts };
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.config;
        if c.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunking.chunk_size must be positive".into()));
        }
        if c.chunking.chunk_overlap >= c.chunking.chunk_size {
            return Err(ConfigError::Invalid(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size".into(),
            ));
        }
        if c.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be at least 1".into()));
        }
        if c.embedding.dimension == 0 {
            return Err(ConfigError::Invalid("embedding.dimension must be positive".into()));
        }
        if !(0.0..=2.0).contains(&c.llm.temperature) {
            return Err(ConfigError::Invalid("llm.temperature must be within 0.0..=2.0".into()));
        }
        if c.llm.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("llm.timeout_seconds must be at least 1".into()));
        }
        for placeholder in ["{context}", "{question}"] {
            if !self.prompts.answer.template.contains(placeholder) {
                return Err(ConfigError::Invalid(format!(
                    "prompts.answer.template must contain {placeholder}"
                )));
            }
        }
        Ok(())
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_yaml_if_exists<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, ConfigError> {
    if path.exists() {
        read_yaml(path).map(Some)
    } else {
        Ok(None)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub document: DocumentConfig,
    pub index: IndexConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub prompts_path: Option<PathBuf>,
}

impl Config {
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = env_var("REPORT_QA_PDF_PATH") {
            self.document.pdf_path = path.into();
        }
        if let Some(dir) = env_var("REPORT_QA_INDEX_DIR") {
            self.index.dir = dir.into();
        }
        if let Some(top_k) = env_var("REPORT_QA_TOP_K") {
            self.retrieval.top_k = top_k
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("REPORT_QA_TOP_K={top_k}")))?;
        }
        if let Some(model) = env_var("REPORT_QA_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(host) = env_var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_var("SERVER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT={port}")))?;
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub pdf_path: PathBuf,
    /// How the prompt refers to the document.
    pub title: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            pdf_path: PathBuf::from("annual_report.pdf"),
            title: "the Annual Report".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("vector_index"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Local,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    /// Where the local model files are cached.
    pub cache_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Local,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            cache_dir: None,
            batch_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Groq,
    Anthropic,
}

impl LlmProvider {
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.3,
            max_tokens: 512,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            upload_dir: PathBuf::from("uploads"),
            max_upload_mb: 64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub answer: AnswerPromptConfig,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnswerPromptConfig {
    pub system: Option<String>,
    pub template: String,
}

impl Default for AnswerPromptConfig {
    fn default() -> Self {
        Self {
            system: None,
            template: DEFAULT_ANSWER_TEMPLATE.to_string(),
        }
    }
}

pub const DEFAULT_ANSWER_TEMPLATE: &str = "You are an AI assistant that answers questions strictly based on the provided context from {title}.
If the answer is not present in the context, say \"I don't have enough information in the document to answer this.\"
Do NOT make up any information.

Context:
{context}

Question: {question}

Answer:";
