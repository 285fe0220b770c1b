use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};
use valor_core::models::image::ImageAttachment;
use valor_core::models::message::Message;

use crate::config::ProviderConfig;
use crate::error::UpstreamError;
use crate::provider::ChatProvider;
use crate::wire::{build_chat_request, build_speech_request, parse_chat_response, status_error};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ChatProvider`] backed by the OpenAI HTTP API.
///
/// One request per call, no retries. Any failure is returned as-is for the
/// caller to collapse into a generic "unavailable" response.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(UpstreamError::NotConfigured)
    }

    /// Send a prepared request and return the body of a 2xx response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, UpstreamError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = status_error(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "upstream call failed");
            return Err(err);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(
        &self,
        transcript: &[Message],
        image: Option<&ImageAttachment>,
    ) -> Result<String, UpstreamError> {
        let api_key = self.api_key()?;
        let body = build_chat_request(&self.config, transcript, image);

        let bytes = self
            .send(
                self.client
                    .post(self.config.endpoint("chat/completions"))
                    .bearer_auth(api_key)
                    .json(&body),
            )
            .await?;

        let reply = parse_chat_response(&bytes)?;
        info!(
            model = %self.config.model,
            messages = body.messages.len(),
            with_image = image.is_some(),
            reply_len = reply.len(),
            "chat completion received"
        );
        Ok(reply)
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, UpstreamError> {
        let api_key = self.api_key()?;
        let body = build_speech_request(&self.config, text);

        let audio = self
            .send(
                self.client
                    .post(self.config.endpoint("audio/speech"))
                    .bearer_auth(api_key)
                    .json(&body),
            )
            .await?;

        if audio.is_empty() {
            return Err(UpstreamError::EmptyReply);
        }
        info!(voice = %self.config.tts_voice, bytes = audio.len(), "speech synthesized");
        Ok(audio)
    }

    async fn probe(&self) -> Result<(), UpstreamError> {
        let api_key = self.api_key()?;
        self.send(
            self.client
                .get(self.config.endpoint("models"))
                .bearer_auth(api_key),
        )
        .await?;
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }
}
