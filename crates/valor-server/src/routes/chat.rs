use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::info;

use valor_core::models::message::Message;

use crate::error::ApiError;
use crate::extract::ChatInput;
use crate::state::AppState;

/// Text used for the user turn when only an image was sent.
pub const IMAGE_ONLY_PROMPT: &str = "What's in this image?";

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: jiff::Timestamp,
}

/// Send one user turn upstream and record the exchange.
///
/// The transcript is only written once the upstream call succeeds, so a
/// failed turn leaves the session exactly as it was. An attached image is
/// sent with this turn and not stored.
pub async fn chat(
    State(state): State<AppState>,
    input: ChatInput,
) -> Result<Json<ChatResponse>, ApiError> {
    let text = match (input.text(), &input.image) {
        (Some(text), _) => text.to_string(),
        (None, Some(_)) => IMAGE_ONLY_PROMPT.to_string(),
        (None, None) => {
            return Err(ApiError::InvalidInput(
                "a message or an image is required".to_string(),
            ));
        }
    };
    let user_id = input.user_id();

    let mut transcript = state.sessions.get(user_id).messages;
    transcript.push(Message::user(text.clone()));

    let reply = state
        .provider
        .complete(&transcript, input.image.as_ref())
        .await?;

    // The image went upstream with this turn only; the transcript keeps text.
    state.sessions.append_exchange(
        user_id,
        Message::user(text),
        Message::assistant(reply.clone()),
    )?;

    info!(
        user_id,
        transcript_len = transcript.len() + 1,
        with_image = input.image.is_some(),
        "chat turn recorded"
    );

    Ok(Json(ChatResponse {
        response: reply,
        timestamp: jiff::Timestamp::now(),
    }))
}
