//! Request and response bodies for the chat completion and speech endpoints.

use serde::{Deserialize, Serialize};
use valor_core::models::image::ImageAttachment;
use valor_core::models::message::{ContentPart, ImageUrl, Message, MessageContent, Role};

use crate::config::ProviderConfig;
use crate::error::UpstreamError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A transcript message as sent upstream: role and content only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub response_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Build the chat completion body for `transcript`.
///
/// Images already in the history are reduced to their text. With an image,
/// the last user message becomes a text part followed by an image part. If
/// the transcript has no user message, one is appended that carries only the
/// image.
pub fn build_chat_request(
    config: &ProviderConfig,
    transcript: &[Message],
    image: Option<&ImageAttachment>,
) -> ChatCompletionRequest {
    let mut messages: Vec<WireMessage> = transcript
        .iter()
        .map(|m| WireMessage {
            role: m.role,
            content: m.content.without_images(),
        })
        .collect();

    if let Some(image) = image {
        let image_part = ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.to_data_url(),
            },
        };

        match messages.iter_mut().rev().find(|m| m.role == Role::User) {
            Some(last_user) => {
                let mut parts = match &last_user.content {
                    MessageContent::Text(text) => vec![ContentPart::Text { text: text.clone() }],
                    MessageContent::Parts(parts) => parts.clone(),
                };
                parts.push(image_part);
                last_user.content = MessageContent::Parts(parts);
            }
            None => messages.push(WireMessage {
                role: Role::User,
                content: MessageContent::Parts(vec![image_part]),
            }),
        }
    }

    ChatCompletionRequest {
        model: config.model.clone(),
        messages,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

pub fn build_speech_request(config: &ProviderConfig, text: &str) -> SpeechRequest {
    SpeechRequest {
        model: config.tts_model.clone(),
        input: text.to_string(),
        voice: config.tts_voice.clone(),
        response_format: "mp3",
    }
}

/// Pull the first choice's text out of a chat completion body.
pub fn parse_chat_response(body: &[u8]) -> Result<String, UpstreamError> {
    let parsed: ChatCompletionResponse = serde_json::from_slice(body)
        .map_err(|e| UpstreamError::ResponseParse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(UpstreamError::EmptyReply)
}

/// Turn a non-success response into [`UpstreamError::Status`], preferring
/// the provider's own error message when the body carries one.
pub fn status_error(status: u16, body: &str) -> UpstreamError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.chars().take(512).collect());
    UpstreamError::Status { status, message }
}
