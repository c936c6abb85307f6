//! The three inquiry levels and their fixed focus metadata.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed presentation metadata for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Focus {
    pub name: &'static str,
    pub hint: &'static str,
    pub icon: &'static str,
    pub metaphor: &'static str,
}

/// Focus table indexed by [`Level::index`].
pub static FOCUSES: [Focus; 3] = [
    Focus {
        name: "Descriptive",
        hint: "what happened",
        icon: "🌤",
        metaphor: "You’re looking at the surface; ripples reflect what just passed.",
    },
    Focus {
        name: "Analytic",
        hint: "why it mattered",
        icon: "🌊",
        metaphor: "You lean closer, peering under the surface where patterns form.",
    },
    Focus {
        name: "Reflexive",
        hint: "what it reveals about self or the world",
        icon: "🌌",
        metaphor: "You see the whole pond, surface and depth together, connected.",
    },
];

/// Inquiry level of a ritual.
///
/// Serialized as its index (0, 1, 2) so persisted sessions keep the integer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    #[default]
    Descriptive,
    Analytic,
    Reflexive,
}

#[derive(Debug, Error)]
#[error("level index {0} is out of range (expected 0..=2)")]
pub struct LevelOutOfRange(pub u8);

impl Level {
    pub const ALL: [Level; 3] = [Level::Descriptive, Level::Analytic, Level::Reflexive];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Level::Descriptive => 0,
            Level::Analytic => 1,
            Level::Reflexive => 2,
        }
    }

    /// One-based level number as shown to the player.
    #[must_use]
    pub const fn number(self) -> usize {
        self.index() + 1
    }

    #[must_use]
    pub fn focus(self) -> &'static Focus {
        &FOCUSES[self.index()]
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.focus().name
    }

    /// The following level, or `None` for the last one.
    #[must_use]
    pub const fn next(self) -> Option<Level> {
        match self {
            Level::Descriptive => Some(Level::Analytic),
            Level::Analytic => Some(Level::Reflexive),
            Level::Reflexive => None,
        }
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        self.next().is_none()
    }
}

impl TryFrom<u8> for Level {
    type Error = LevelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Level::Descriptive),
            1 => Ok(Level::Analytic),
            2 => Ok(Level::Reflexive),
            other => Err(LevelOutOfRange(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.index() as u8
    }
}
