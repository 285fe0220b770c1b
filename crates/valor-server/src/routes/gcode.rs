use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use valor_core::models::message::Message;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub const GCODE_SYSTEM_PROMPT: &str = "You are a CNC programming assistant. \
Given a description of a part or toolpath, reply with valid G-code only. \
Use millimetres (G21) and absolute positioning (G90), start with a safe \
retract, and end with M30. Put any explanation in G-code comments.";

#[derive(Deserialize)]
pub struct GcodeRequest {
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct GcodeResponse {
    pub gcode: String,
}

/// One-shot G-code generation. Nothing is written to a session.
pub async fn generate_gcode(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GcodeRequest>,
) -> Result<Json<GcodeResponse>, ApiError> {
    let description = req.description.trim();
    if description.is_empty() {
        return Err(ApiError::InvalidInput("description is required".to_string()));
    }

    let transcript = [
        Message::system(GCODE_SYSTEM_PROMPT),
        Message::user(description),
    ];
    let reply = state.provider.complete(&transcript, None).await?;

    Ok(Json(GcodeResponse {
        gcode: strip_code_fence(&reply).to_string(),
    }))
}

/// Remove a surrounding Markdown code fence, if the model added one.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (`gcode`, `nc`, ...) on the opening line.
    match body.split_once('\n') {
        Some((_, code)) => code.trim(),
        None => body.trim(),
    }
}
