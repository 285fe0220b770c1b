use axum::Json;
use axum::extract::State;
use serde::Serialize;

use valor_core::models::message::Message;

use crate::error::ApiError;
use crate::extract::ChatInput;
use crate::state::AppState;

pub const DEFAULT_ANALYSIS_PROMPT: &str =
    "Analyze this image in detail. Describe what you see, including any notable objects, text, people, or context.";

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
}

/// One-shot image analysis. Nothing is written to a session.
pub async fn analyze_image(
    State(state): State<AppState>,
    input: ChatInput,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let image = input
        .image
        .as_ref()
        .ok_or_else(|| ApiError::InvalidInput("an image is required".to_string()))?;
    let prompt = input
        .prompt_text()
        .or(input.text())
        .unwrap_or(DEFAULT_ANALYSIS_PROMPT);

    let transcript = [
        Message::system(&*state.system_prompt),
        Message::user(prompt),
    ];
    let analysis = state.provider.complete(&transcript, Some(image)).await?;

    Ok(Json(AnalysisResponse { analysis }))
}
