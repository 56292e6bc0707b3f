use axum::{extract::State, Json};
use serde::Deserialize;

use crate::api::{error::ApiError, state::AppState};
use crate::domain::AnswerResult;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerResult>, ApiError> {
    let result = state.qa.answer(&request.question).await?;
    Ok(Json(result))
}

pub async fn examples_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.config.prompts.examples.clone())
}
