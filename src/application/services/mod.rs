mod ingest;
mod qa;
mod rag;

pub use ingest::{IngestOutcome, IngestReport, IngestService};
pub use qa::QaService;
pub use rag::RagService;
