use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::{IngestService, QaService};
use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::AppConfig;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ingest: Arc<IngestService>,
    pub qa: Arc<QaService>,
    pub llm: Arc<dyn LlmService>,
    ingest_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            config: pipeline.config,
            ingest: pipeline.ingest,
            qa: pipeline.qa,
            llm: pipeline.llm,
            ingest_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Only one ingestion may run at a time; a second request is refused
    /// rather than queued.
    pub fn begin_ingest(&self) -> Result<OwnedMutexGuard<()>, DomainError> {
        self.ingest_lock
            .clone()
            .try_lock_owned()
            .map_err(|_| DomainError::conflict("An ingestion is already in progress"))
    }
}
