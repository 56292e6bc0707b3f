use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub index: String,
    pub credentials: String,
    pub chunks: usize,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let loaded = state.qa.rag().is_ready().await;
    let chunks = state.qa.rag().indexed_chunks().await.unwrap_or(0);
    let credentials = state.llm.check_credentials().is_ok();

    let is_ready = loaded && credentials;

    let response = ReadinessResponse {
        status: if is_ready { "ready" } else { "not_ready" }.into(),
        index: if loaded { "loaded" } else { "missing" }.into(),
        credentials: if credentials { "configured" } else { "missing" }.into(),
        chunks,
    };

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
