//! Generation request model.
//!
//! A request is an ordered list of role-tagged messages plus sampling knobs.
//! The pond always sends one `system` instruction followed by one `user` bundle.

use serde::{Deserialize, Serialize};

/// Nucleus sampling value used by every call site.
pub const TOP_P: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub top_p: f64,
}

impl GenerationRequest {
    /// Build the two-message request used throughout the ritual.
    #[must_use]
    pub fn instructed(system: impl Into<String>, user: impl Into<String>, temperature: f64) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
            top_p: TOP_P,
        }
    }

    /// Content of the first message with the given role.
    #[must_use]
    pub fn content_of(&self, role: ChatRole) -> Option<&str> {
        self.messages
            .iter()
            .find(|message| message.role == role)
            .map(|message| message.content.as_str())
    }
}
