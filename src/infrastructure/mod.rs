pub mod config;
pub mod embedding;
pub mod llm;
pub mod loader;
pub mod telemetry;
pub mod vector_store;

pub use config::{AppConfig, Config, ConfigError, PromptsConfig};
pub use embedding::{LocalEmbedding, OpenAiEmbedding};
pub use llm::HostedLlm;
pub use loader::PdfLoader;
pub use telemetry::init_tracing;
pub use vector_store::{DirectoryIndexStorage, InMemoryVectorStore};
