use serde::{Deserialize, Serialize};

use super::SearchResult;

/// Characters of chunk text shown in a source preview.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunk {
    pub page: u32,
    /// Preview of the chunk, cut at [`PREVIEW_CHARS`] characters.
    pub content: String,
    pub full_content: String,
    pub score: f32,
}

impl From<SearchResult> for SourceChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            page: result.chunk.page(),
            content: preview(&result.chunk.content, PREVIEW_CHARS),
            full_content: result.chunk.content,
            score: result.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourceChunk>,
    pub num_sources: usize,
}

impl AnswerResult {
    pub fn new(answer: impl Into<String>, sources: Vec<SourceChunk>) -> Self {
        let num_sources = sources.len();
        Self {
            answer: answer.into(),
            sources,
            num_sources,
        }
    }
}

/// Truncates `text` to `max_chars` characters, appending an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
