//! Image attachments sent alongside a user message.
//!
//! Images arrive either as base64 text (optionally wrapped in a `data:` URL)
//! or as raw bytes from a multipart upload. Both paths end in an
//! [`ImageAttachment`] with a known `image/*` media type; anything that cannot
//! be decoded or identified is rejected with [`CoreError::InvalidImage`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    /// Decode a base64 payload or a `data:<mime>;base64,<payload>` URL.
    pub fn from_base64(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();

        let (declared, payload) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| CoreError::InvalidImage("data URL has no payload".into()))?;
                let media_type = header.strip_suffix(";base64").ok_or_else(|| {
                    CoreError::InvalidImage("data URL is not base64-encoded".into())
                })?;
                (Some(media_type), payload)
            }
            None => (None, input),
        };

        let bytes = BASE64_STANDARD
            .decode(payload)
            .map_err(|e| CoreError::InvalidImage(format!("base64 decode failed: {e}")))?;

        Self::from_bytes(bytes, declared)
    }

    /// Build from raw bytes. A declared `image/*` type wins; otherwise the
    /// format is sniffed from the leading bytes.
    pub fn from_bytes(bytes: Vec<u8>, declared: Option<&str>) -> Result<Self, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::InvalidImage("image is empty".into()));
        }

        let media_type = match declared.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) if d.starts_with("image/") => d.to_string(),
            Some(d) if d != "application/octet-stream" => {
                return Err(CoreError::InvalidImage(format!(
                    "unsupported media type: {d}"
                )));
            }
            _ => sniff_media_type(&bytes)
                .ok_or_else(|| CoreError::InvalidImage("unrecognized image format".into()))?
                .to_string(),
        };

        Ok(Self { media_type, bytes })
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
