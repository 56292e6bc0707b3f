use std::sync::Arc;
use tracing::instrument;

use super::RagService;
use crate::domain::{
    ports::LlmService,
    prompt::{format_context, PromptTemplate},
    AnswerResult, DomainError, SourceChunk,
};

/// Answers questions about the indexed document: retrieves the closest
/// chunks, fills the prompt template and asks the LLM.
pub struct QaService {
    rag: Arc<RagService>,
    llm: Arc<dyn LlmService>,
    template: PromptTemplate,
    system: Option<String>,
    title: String,
}

impl QaService {
    pub fn new(
        rag: Arc<RagService>,
        llm: Arc<dyn LlmService>,
        template: PromptTemplate,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            rag,
            llm,
            template: template.require(&["context", "question"])?,
            system: None,
            title: "the document".to_string(),
        })
    }

    pub fn with_system_prompt(mut self, system: Option<String>) -> Self {
        self.system = system.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn rag(&self) -> &RagService {
        &self.rag
    }

    /// Checks run in order: a blank question, then a missing index, then a
    /// missing credential. Nothing is sent upstream until all three pass.
    #[instrument(skip(self), fields(top_k = self.rag.default_top_k()))]
    pub async fn answer(&self, question: &str) -> Result<AnswerResult, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("Query cannot be empty"));
        }
        if !self.rag.is_ready().await {
            return Err(DomainError::not_found(
                "No index loaded. Ingest or load the document first.",
            ));
        }
        self.llm.check_credentials()?;

        let results = self.rag.retrieve(question).await?;
        let context = format_context(&results);
        let prompt = self.template.render(&[
            ("title", self.title.as_str()),
            ("context", context.as_str()),
            ("question", question),
        ]);

        let answer = match &self.system {
            Some(system) => self.llm.complete_with_system(system, &prompt).await?,
            None => self.llm.complete(&prompt).await?,
        };

        let sources: Vec<SourceChunk> = results.into_iter().map(SourceChunk::from).collect();
        tracing::info!(sources = sources.len(), "answer generated");

        Ok(AnswerResult::new(answer, sources))
    }
}
