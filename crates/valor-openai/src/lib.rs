//! valor-openai
//!
//! Upstream client for an OpenAI-compatible chat, speech and model API.
//! Everything the relay cannot do itself (language, vision, speech) goes
//! through the [`provider::ChatProvider`] seam defined here.

pub mod client;
pub mod config;
pub mod error;
pub mod provider;
pub mod wire;
