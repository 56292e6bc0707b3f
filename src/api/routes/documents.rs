use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::{error::ApiError, state::AppState};
use crate::application::IngestReport;
use crate::domain::{DomainError, IndexManifest};

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct IndexStatusResponse {
    pub loaded: bool,
    pub chunks: usize,
    pub location: String,
    pub manifest: Option<IndexManifest>,
}

pub async fn index_status(State(state): State<AppState>) -> Result<Json<IndexStatusResponse>, ApiError> {
    let rag = state.qa.rag();
    Ok(Json(IndexStatusResponse {
        loaded: rag.is_ready().await,
        chunks: rag.indexed_chunks().await?,
        location: state.config.config.index.dir.display().to_string(),
        manifest: state.ingest.manifest().await?,
    }))
}

/// Loads the persisted index without rebuilding it.
pub async fn load_index(State(state): State<AppState>) -> Result<Json<IngestReport>, ApiError> {
    let _guard = state.begin_ingest()?;
    let report = state.ingest.load_index().await?;
    Ok(Json(report))
}

/// Stores the uploaded PDF and rebuilds the index from it.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    let _guard = state.begin_ingest()?;

    let mut saved = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = sanitize_file_name(field.file_name().unwrap_or("upload.pdf"));
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DomainError::validation(format!("Failed to read upload: {e}")))?;

        if bytes.is_empty() {
            return Err(DomainError::validation("Uploaded file is empty").into());
        }
        if !bytes.starts_with(b"%PDF") {
            return Err(DomainError::validation("Uploaded file is not a PDF").into());
        }

        let dir = &state.config.config.server.upload_dir;
        tokio::fs::create_dir_all(dir).await.map_err(DomainError::from)?;
        let path = dir.join(format!("{}-{file_name}", Uuid::new_v4().simple()));
        tokio::fs::write(&path, &bytes).await.map_err(DomainError::from)?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "PDF uploaded");
        saved = Some(path);
        break;
    }

    let path = saved.ok_or_else(|| {
        DomainError::validation(format!("Multipart field `{UPLOAD_FIELD}` is required"))
    })?;

    let previous = state
        .ingest
        .manifest()
        .await
        .ok()
        .flatten()
        .map(|m| PathBuf::from(m.source_path));

    match state.ingest.build_index(&path, true).await {
        Ok(report) => {
            if let Some(previous) = previous {
                remove_stale_upload(&state.config.config.server.upload_dir, &previous, &path).await;
            }
            Ok(Json(report))
        }
        Err(e) => {
            discard(&path).await;
            Err(e.into())
        }
    }
}

/// Deletes the upload the replaced index was built from, if it came from
/// `upload_dir`.
async fn remove_stale_upload(upload_dir: &Path, previous: &Path, current: &Path) {
    if previous != current && previous.starts_with(upload_dir) {
        discard(previous).await;
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "could not remove upload");
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.pdf");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload.pdf".to_string()
    } else {
        cleaned
    }
}
