//! valor-core
//!
//! Pure domain types for the Valor chat relay: roles, messages, sessions
//! and image attachments. No network or filesystem dependency.

pub mod error;
pub mod models;
