use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid image: {0}")]
    InvalidImage(String),
}
