use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream credentials are not configured")]
    NotConfigured,

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("upstream returned no content")]
    EmptyReply,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Transport(e.to_string())
    }
}
