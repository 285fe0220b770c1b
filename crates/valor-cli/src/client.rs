//! HTTP client for a running valor server.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid server URL {0:?}")]
    InvalidUrl(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AskRequest<'a> {
    message: &'a str,
    user_id: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ValorClient {
    http: reqwest::Client,
    base_url: Url,
    user_id: String,
}

impl ValorClient {
    pub fn new(base_url: &str, user_id: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let parsed = Url::parse(base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| ClientError::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            http,
            base_url: parsed,
            user_id: user_id.to_string(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Send one message and return the assistant's reply.
    pub async fn ask(&self, message: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "ask"]))
            .json(&AskRequest {
                message,
                user_id: &self.user_id,
            })
            .send()
            .await?;
        let response = check(response).await?;
        let body: AskResponse = response.json().await?;
        Ok(body.response)
    }

    pub async fn clear(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.endpoint(&["api", "conversation", self.user_id.as_str(), "clear"]))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

impl ValorClient {
    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or(text);
    tracing::debug!(status = status.as_u16(), %message, "server rejected request");
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
