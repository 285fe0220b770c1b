use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ApiKeyStatus {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report whether the upstream credential is set and accepted.
///
/// Without a credential no network call is made.
pub async fn check_api_key(State(state): State<AppState>) -> Json<ApiKeyStatus> {
    if !state.provider.is_configured() {
        return Json(ApiKeyStatus {
            valid: false,
            error: Some("OPENAI_API_KEY is not set".to_string()),
        });
    }

    match state.provider.probe().await {
        Ok(()) => Json(ApiKeyStatus {
            valid: true,
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "credential probe failed");
            Json(ApiKeyStatus {
                valid: false,
                error: Some("credential was rejected or the service is unreachable".to_string()),
            })
        }
    }
}
