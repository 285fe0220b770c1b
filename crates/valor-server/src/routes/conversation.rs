use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use valor_core::models::session::Session;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ClearResponse {
    pub success: bool,
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<Session> {
    Json(state.sessions.get(&user_id))
}

/// Reset the transcript to the system instruction.
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.sessions.clear(&user_id)?;
    tracing::info!(user_id = %user_id, "conversation cleared");
    Ok(Json(ClearResponse { success: true }))
}
