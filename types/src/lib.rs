//! Core domain types for Memory Pond.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod chat;
mod focus;
mod history;
mod ids;
mod text;
mod turn;

pub use chat::{ChatMessage, ChatRole, GenerationRequest, TOP_P};
pub use focus::{FOCUSES, Focus, Level, LevelOutOfRange};
pub use history::{ArchiveChoice, HistoryEntry, LevelSynthesis};
pub use ids::SessionId;
pub use text::{take_words, word_count};
pub use turn::{PhaseLabel, Turn};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// NonEmpty String Types
// ============================================================================

/// A string guaranteed to be non-empty (after trimming).
///
/// The stored value is trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

#[derive(Debug, Error)]
#[error("value must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Err(EmptyStringError)
        } else if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::ops::Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
