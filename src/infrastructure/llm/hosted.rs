use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::{anthropic, groq};

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::{LlmConfig, LlmProvider};

/// A hosted chat model reached through rig. The credential is read from the
/// provider's environment variable at call time.
pub struct HostedLlm {
    provider: LlmProvider,
    model: String,
    temperature: f64,
    max_tokens: u64,
    timeout: Duration,
}

impl HostedLlm {
    pub fn new(provider: LlmProvider, model: impl Into<String>) -> Self {
        Self::from_config(&LlmConfig {
            provider,
            model: model.into(),
            ..LlmConfig::default()
        })
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            provider: config.provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn run(&self, system: Option<&str>, prompt: &str) -> Result<String, DomainError> {
        self.check_credentials()?;

        let call = async {
            match self.provider {
                LlmProvider::Groq => {
                    let client = groq::Client::from_env();
                    let mut builder = client
                        .agent(&self.model)
                        .temperature(self.temperature)
                        .max_tokens(self.max_tokens);
                    if let Some(system) = system {
                        builder = builder.preamble(system);
                    }
                    let agent = builder.build();
                    agent.prompt(prompt).await
                }
                LlmProvider::Anthropic => {
                    let client = anthropic::Client::from_env();
                    let mut builder = client
                        .agent(&self.model)
                        .temperature(self.temperature)
                        .max_tokens(self.max_tokens);
                    if let Some(system) = system {
                        builder = builder.preamble(system);
                    }
                    let agent = builder.build();
                    agent.prompt(prompt).await
                }
            }
        };

        within(self.timeout, &self.model, call)
            .await?
            .map_err(|e| classify_provider_error(&e.to_string()))
    }
}

/// Awaits `call`, giving up with `Timeout` once `limit` has passed.
async fn within<T>(
    limit: Duration,
    model: &str,
    call: impl Future<Output = T>,
) -> Result<T, DomainError> {
    tokio::time::timeout(limit, call).await.map_err(|_| {
        DomainError::timeout(format!(
            "no response from {model} within {:.1}s",
            limit.as_secs_f64()
        ))
    })
}

#[async_trait]
impl LlmService for HostedLlm {
    fn check_credentials(&self) -> Result<(), DomainError> {
        let var = self.provider.api_key_env();
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(DomainError::configuration(format!(
                "{var} not found. Please set it in .env file or environment."
            ))),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.run(None, prompt).await
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.run(Some(system), prompt).await
    }
}

/// Sorts a provider failure into rate limiting, a rejected credential, or a
/// generic upstream fault. The message itself is passed through.
pub fn classify_provider_error(message: &str) -> DomainError {
    let lower = message.to_ascii_lowercase();

    if lower.contains("429")
        || lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("too many requests")
    {
        DomainError::rate_limited(message)
    } else if lower.contains("401")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
        || lower.contains("invalid_api_key")
    {
        DomainError::configuration(message)
    } else {
        DomainError::external(message)
    }
}
