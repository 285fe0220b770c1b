use serde::{Deserialize, Serialize};

use crate::models::message::{Message, Role};

/// A per-user transcript.
///
/// The first message is the system instruction the session was seeded with.
/// Messages are only ever appended; `reset` is the one way to shrink it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub messages: Vec<Message>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, system_prompt: &str) -> Self {
        Self {
            user_id: user_id.into(),
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Truncate back to the system instruction.
    pub fn reset(&mut self) {
        let keep = match self.messages.first() {
            Some(m) if m.role == Role::System => 1,
            _ => 0,
        };
        self.messages.truncate(keep);
    }

    pub fn system_message(&self) -> Option<&Message> {
        self.messages.first().filter(|m| m.role == Role::System)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
