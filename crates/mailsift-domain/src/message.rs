//! Chat turns exchanged with the completion capability

use serde::{Deserialize, Serialize};

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The caller (prompt and corrective feedback)
    User,
    /// The model
    Assistant,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the turn
    pub role: Role,
    /// Turn text
    pub content: String,
}

impl ChatMessage {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Ordered chat history for a single request
///
/// Created at the start of one extraction and owned by it until the retry
/// sequence ends; never shared between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a conversation with a single user prompt
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
        }
    }

    /// Append a turn
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// All turns in order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether there are no turns
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent turn
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
