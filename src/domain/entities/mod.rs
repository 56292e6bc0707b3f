mod answer;
mod document;
mod embedding;
mod index;

pub use answer::{preview, AnswerResult, SourceChunk, PREVIEW_CHARS};
pub use document::{ChunkMetadata, DocumentChunk, Page, SearchResult};
pub use embedding::Embedding;
pub use index::{IndexManifest, IndexedChunk, StoredIndex, INDEX_FORMAT_VERSION};
