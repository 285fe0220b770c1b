use async_trait::async_trait;
use valor_core::models::image::ImageAttachment;
use valor_core::models::message::Message;

use crate::error::UpstreamError;

/// The external model provider, seen from the relay.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send `transcript` and return the assistant's reply text.
    ///
    /// When `image` is given it is attached to the most recent user message.
    async fn complete(
        &self,
        transcript: &[Message],
        image: Option<&ImageAttachment>,
    ) -> Result<String, UpstreamError>;

    /// Turn `text` into `audio/mpeg` bytes.
    async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, UpstreamError>;

    /// Cheap authenticated call used to check that the credential works.
    async fn probe(&self) -> Result<(), UpstreamError>;

    fn is_configured(&self) -> bool;
}
