//! Environment-driven server configuration.
//!
//! Everything is read once at startup. Unset or blank variables fall back to
//! defaults; a value that is set but cannot be parsed is an error, so a typo
//! in `PORT` fails loudly instead of silently binding elsewhere.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use valor_openai::config::{self as provider_defaults, ProviderConfig};
use valor_storage::store::DEFAULT_CAPACITY;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_ASSISTANT_NAME: &str = "Valor";
pub const DEFAULT_TAGLINE: &str = "Your loyal AI companion with full memory";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Valor, an advanced AI assistant and loyal \
companion. You remember the whole conversation and are proactive, intelligent, and dedicated \
to helping your user, whom you call 'Commander'. You can analyze images and answer by voice. \
Always keep your personality as a loyal AI partner.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub provider: ProviderConfig,
    pub system_prompt: String,
    pub assistant_name: String,
    pub tagline: String,
    pub session_capacity: usize,
    /// `None` disables snapshot persistence.
    pub snapshot_path: Option<PathBuf>,
    pub flush_interval: Duration,
    pub log_json: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = ProviderConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| provider_defaults::DEFAULT_BASE_URL.to_string()),
            model: get("OPENAI_MODEL")
                .unwrap_or_else(|| provider_defaults::DEFAULT_MODEL.to_string()),
            max_tokens: parse(&get, "OPENAI_MAX_TOKENS", provider_defaults::DEFAULT_MAX_TOKENS)?,
            temperature: parse(
                &get,
                "OPENAI_TEMPERATURE",
                provider_defaults::DEFAULT_TEMPERATURE,
            )?,
            tts_model: get("OPENAI_TTS_MODEL")
                .unwrap_or_else(|| provider_defaults::DEFAULT_TTS_MODEL.to_string()),
            tts_voice: get("OPENAI_TTS_VOICE")
                .unwrap_or_else(|| provider_defaults::DEFAULT_TTS_VOICE.to_string()),
            timeout: Duration::from_secs(parse(
                &get,
                "UPSTREAM_TIMEOUT_SECS",
                provider_defaults::DEFAULT_TIMEOUT.as_secs(),
            )?),
        };

        if !(0.0..=2.0).contains(&provider.temperature) {
            return Err(invalid(
                "OPENAI_TEMPERATURE",
                provider.temperature.to_string(),
                "must be between 0 and 2",
            ));
        }
        if provider.max_tokens == 0 {
            return Err(invalid("OPENAI_MAX_TOKENS", "0".into(), "must be positive"));
        }
        if provider.timeout.is_zero() {
            return Err(invalid("UPSTREAM_TIMEOUT_SECS", "0".into(), "must be positive"));
        }

        let session_capacity = parse(&get, "VALOR_SESSION_CAPACITY", DEFAULT_CAPACITY)?;
        if session_capacity == 0 {
            return Err(invalid("VALOR_SESSION_CAPACITY", "0".into(), "must be positive"));
        }

        let flush_secs = parse(&get, "VALOR_FLUSH_INTERVAL_SECS", DEFAULT_FLUSH_INTERVAL.as_secs())?;
        if flush_secs == 0 {
            return Err(invalid("VALOR_FLUSH_INTERVAL_SECS", "0".into(), "must be positive"));
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse(&get, "PORT", DEFAULT_PORT)?,
            provider,
            system_prompt: get("VALOR_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            assistant_name: get("VALOR_ASSISTANT_NAME")
                .unwrap_or_else(|| DEFAULT_ASSISTANT_NAME.to_string()),
            tagline: get("VALOR_TAGLINE").unwrap_or_else(|| DEFAULT_TAGLINE.to_string()),
            session_capacity,
            snapshot_path: get("VALOR_SNAPSHOT_PATH").map(PathBuf::from),
            flush_interval: Duration::from_secs(flush_secs),
            log_json: matches!(
                get("VALOR_LOG_JSON").as_deref(),
                Some("1" | "true" | "yes")
            ),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| invalid(key, raw.clone(), e.to_string())),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.into(),
    }
}
