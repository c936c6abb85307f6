//! Transcript entries and level syntheses.

use serde::{Deserialize, Serialize};

/// One entry of the ritual transcript.
///
/// Serialized externally tagged (`{"player": "..."}`) so stored transcripts stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEntry {
    /// Text supplied by the player.
    Player(String),
    /// Enforced text generated by the pond.
    Pond(String),
    /// The closing artifact produced when the ritual finishes.
    Artifact(String),
}

impl HistoryEntry {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            HistoryEntry::Player(text) | HistoryEntry::Pond(text) | HistoryEntry::Artifact(text) => {
                text
            }
        }
    }

    #[must_use]
    pub fn player_text(&self) -> Option<&str> {
        match self {
            HistoryEntry::Player(text) => Some(text),
            HistoryEntry::Pond(_) | HistoryEntry::Artifact(_) => None,
        }
    }

    #[must_use]
    pub fn artifact_text(&self) -> Option<&str> {
        match self {
            HistoryEntry::Artifact(text) => Some(text),
            HistoryEntry::Player(_) | HistoryEntry::Pond(_) => None,
        }
    }
}

/// Summary recorded when a level closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSynthesis {
    #[serde(rename = "level")]
    pub level_name: String,
    #[serde(rename = "summary")]
    pub summary_text: String,
}

impl LevelSynthesis {
    #[must_use]
    pub fn new(level_name: impl Into<String>, summary_text: impl Into<String>) -> Self {
        Self {
            level_name: level_name.into(),
            summary_text: summary_text.into(),
        }
    }
}

/// The player's final disposition of the memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveChoice {
    /// Accepted and integrated.
    Float,
    /// Released.
    Sink,
    /// Kept close for now.
    #[default]
    Hold,
}

impl ArchiveChoice {
    pub const ALL: [ArchiveChoice; 3] = [ArchiveChoice::Float, ArchiveChoice::Sink, ArchiveChoice::Hold];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ArchiveChoice::Float => "float",
            ArchiveChoice::Sink => "sink",
            ArchiveChoice::Hold => "hold",
        }
    }

    /// Exact, case-insensitive match on the choice name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for ArchiveChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchiveChoice, HistoryEntry, LevelSynthesis};

    #[test]
    fn history_entry_uses_tagged_object() {
        let json = serde_json::to_string(&HistoryEntry::Player("the bus was late".into())).unwrap();
        assert_eq!(json, r#"{"player":"the bus was late"}"#);

        let entry: HistoryEntry = serde_json::from_str(r#"{"artifact":"kept"}"#).unwrap();
        assert_eq!(entry.artifact_text(), Some("kept"));
        assert_eq!(entry.player_text(), None);
    }

    #[test]
    fn synthesis_serializes_with_short_keys() {
        let synthesis = LevelSynthesis::new("Descriptive", "You named the morning.");
        let value = serde_json::to_value(&synthesis).unwrap();
        assert_eq!(value["level"], "Descriptive");
        assert_eq!(value["summary"], "You named the morning.");
    }

    #[test]
    fn archive_choice_parse_is_exact() {
        assert_eq!(ArchiveChoice::parse("SINK"), Some(ArchiveChoice::Sink));
        assert_eq!(ArchiveChoice::parse(" hold "), Some(ArchiveChoice::Hold));
        assert_eq!(ArchiveChoice::parse("floating"), None);
    }
}
