//! Request extractors that reject with [`ApiError`] instead of axum's
//! plain-text rejections.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde::Deserialize;
use valor_core::models::image::ImageAttachment;

use crate::error::ApiError;

pub const DEFAULT_USER_ID: &str = "default";

/// `axum::Json` with [`ApiError`] as its rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// A chat-style submission: text, user identifier, optional image.
///
/// Accepted as JSON (`image` as base64 or a data URL) or as
/// `multipart/form-data` (`image` as a file field). An image that cannot be
/// decoded rejects the whole request.
#[derive(Debug, Default)]
pub struct ChatInput {
    pub message: Option<String>,
    pub user_id: Option<String>,
    pub prompt: Option<String>,
    pub image: Option<ImageAttachment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonChatBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "user_id")]
    user_id: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

impl ChatInput {
    /// Trimmed message text, if any.
    pub fn text(&self) -> Option<&str> {
        non_blank(self.message.as_deref())
    }

    pub fn prompt_text(&self) -> Option<&str> {
        non_blank(self.prompt.as_deref())
    }

    /// The caller's identifier, falling back to [`DEFAULT_USER_ID`].
    pub fn user_id(&self) -> &str {
        non_blank(self.user_id.as_deref()).unwrap_or(DEFAULT_USER_ID)
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut input = ChatInput::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "message" => input.message = Some(field.text().await?),
                "userId" | "user_id" => input.user_id = Some(field.text().await?),
                "prompt" => input.prompt = Some(field.text().await?),
                "image" => {
                    let declared = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was chosen.
                    if !bytes.is_empty() {
                        input.image = Some(ImageAttachment::from_bytes(
                            bytes.to_vec(),
                            declared.as_deref(),
                        )?);
                    }
                }
                _ => {}
            }
        }

        Ok(input)
    }

    fn from_json(body: JsonChatBody) -> Result<Self, ApiError> {
        let image = match non_blank(body.image.as_deref()) {
            Some(encoded) => Some(ImageAttachment::from_base64(encoded)?),
            None => None,
        };

        Ok(ChatInput {
            message: body.message,
            user_id: body.user_id,
            prompt: body.prompt,
            image,
        })
    }
}

impl<S> FromRequest<S> for ChatInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state).await?;
            Self::from_multipart(multipart).await
        } else {
            let ApiJson(body) = ApiJson::<JsonChatBody>::from_request(req, state).await?;
            Self::from_json(body)
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
