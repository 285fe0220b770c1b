use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use valor_core::error::CoreError;
use valor_openai::error::UpstreamError;
use valor_storage::error::StorageError;

pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "AI service temporarily unavailable";
pub const NOT_CONFIGURED_MESSAGE: &str = "AI service is not configured";

/// Unified API error type for all route handlers.
///
/// Every failure a client can see is one of these three kinds. Upstream
/// detail is logged, never returned.
#[derive(Debug)]
pub enum ApiError {
    InvalidInput(String),
    UpstreamUnavailable(String),
    NotConfigured,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::UpstreamUnavailable(_) => "upstream_unavailable",
            ApiError::NotConfigured => "not_configured",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable(_) | ApiError::NotConfigured => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            ApiError::InvalidInput(msg) => msg,
            ApiError::UpstreamUnavailable(detail) => {
                tracing::error!("upstream failure: {detail}");
                UPSTREAM_UNAVAILABLE_MESSAGE.to_string()
            }
            ApiError::NotConfigured => {
                tracing::warn!("request rejected: upstream credentials are not configured");
                NOT_CONFIGURED_MESSAGE.to_string()
            }
        };

        (status, Json(ErrorBody { error: message, kind })).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotConfigured => ApiError::NotConfigured,
            other => ApiError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::InvalidInput(e.to_string())
    }
}

// Session writes only fail on a bad identifier.
impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::InvalidInput(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::InvalidInput(e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        ApiError::InvalidInput(e.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::InvalidInput(e.body_text())
    }
}
