use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: String,
}

/// Proxy text to the speech endpoint and relay the MP3 bytes.
pub async fn speak(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SpeakRequest>,
) -> Result<Response, ApiError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::InvalidInput("text is required".to_string()));
    }

    let audio = state.provider.synthesize_speech(text).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}
