//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! adapters: ingestion builds or loads the index, retrieval embeds a query
//! and searches it, and question answering composes the two with the LLM.

pub mod services;

pub use services::{IngestOutcome, IngestReport, IngestService, QaService, RagService};
