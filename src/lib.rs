//! Question answering over a single annual-report PDF: the document is
//! chunked and embedded into a persisted index, and questions are answered
//! by an LLM from the closest chunks.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod pipeline;

pub use pipeline::{Adapters, Pipeline};
