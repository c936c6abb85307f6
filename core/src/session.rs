//! Per-player ritual state.
//!
//! A [`RitualSession`] is plain data: the engine mutates it in place and the
//! session stores persist it as JSON. Deserialization re-checks the structural
//! invariants, so a hand-edited or truncated record is rejected instead of
//! driving the state machine into an impossible position.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pond_types::{ArchiveChoice, HistoryEntry, Level, LevelSynthesis, NonEmptyString};

use crate::error::ValidationError;

/// Position within the current level's two dialogue rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RoundStep {
    /// The next reply opens round 1 and re-anchors the level notes.
    #[default]
    First,
    /// The next reply produces round 2.
    Second,
    /// The next reply closes the level.
    Closing,
}

impl From<RoundStep> for u8 {
    fn from(step: RoundStep) -> Self {
        match step {
            RoundStep::First => 0,
            RoundStep::Second => 1,
            RoundStep::Closing => 2,
        }
    }
}

#[derive(Debug, Error)]
#[error("round step {0} is out of range (expected 0..=2)")]
pub struct RoundStepOutOfRange(pub u8);

impl TryFrom<u8> for RoundStep {
    type Error = RoundStepOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RoundStep::First),
            1 => Ok(RoundStep::Second),
            2 => Ok(RoundStep::Closing),
            other => Err(RoundStepOutOfRange(other)),
        }
    }
}

/// Where the ritual is waiting.
///
/// The archive choice lives inside `Finished`, so a finished session always
/// has one and an unfinished session never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Dialogue rounds within a level.
    #[default]
    Normal,
    /// A level closed; waiting for continue or more detail.
    AwaitingLevelDecision,
    /// The last level closed; waiting for float, sink or hold.
    AwaitingArchiveChoice,
    /// Terminal.
    Finished(ArchiveChoice),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionInvariantError {
    #[error("level anchor {anchor} is past the end of a {len}-entry history")]
    AnchorOutOfRange { anchor: usize, len: usize },
    #[error("phase {phase:?} at level {level} cannot have {summaries} level summaries")]
    SummaryCount {
        phase: Phase,
        level: usize,
        summaries: usize,
    },
    #[error("phase {phase:?} is not reachable at level {level}")]
    PhaseLevel { phase: Phase, level: usize },
}

/// Complete state of one memory's ritual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord", into = "SessionRecord")]
pub struct RitualSession {
    title: NonEmptyString,
    offering: String,
    level: Level,
    round_step: RoundStep,
    history: Vec<HistoryEntry>,
    summaries: Vec<LevelSynthesis>,
    level_anchor: usize,
    phase: Phase,
}

impl RitualSession {
    /// Fresh session at level 1, round 1. The title must contain non-whitespace text.
    pub fn start(title: &str, offering: &str) -> Result<Self, ValidationError> {
        let title = NonEmptyString::new(title).map_err(|_| ValidationError::EmptyTitle)?;
        Ok(Self {
            title,
            offering: offering.trim().to_string(),
            level: Level::Descriptive,
            round_step: RoundStep::First,
            history: Vec::new(),
            summaries: Vec::new(),
            level_anchor: 0,
            phase: Phase::Normal,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    #[must_use]
    pub fn offering(&self) -> &str {
        &self.offering
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn round_step(&self) -> RoundStep {
        self.round_step
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn summaries(&self) -> &[LevelSynthesis] {
        &self.summaries
    }

    #[must_use]
    pub fn level_anchor(&self) -> usize {
        self.level_anchor
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn archive_choice(&self) -> Option<ArchiveChoice> {
        match self.phase {
            Phase::Finished(choice) => Some(choice),
            Phase::Normal | Phase::AwaitingLevelDecision | Phase::AwaitingArchiveChoice => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Player entries recorded since the current level's anchor.
    pub fn level_notes(&self) -> impl Iterator<Item = &str> {
        self.history[self.level_anchor..]
            .iter()
            .filter_map(HistoryEntry::player_text)
    }

    /// Most recent artifact in the transcript, if one was generated.
    #[must_use]
    pub fn last_artifact(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find_map(HistoryEntry::artifact_text)
    }

    pub(crate) fn push(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    pub(crate) fn set_round_step(&mut self, step: RoundStep) {
        self.round_step = step;
    }

    pub(crate) fn anchor_at_end(&mut self) {
        self.level_anchor = self.history.len();
    }

    pub(crate) fn record_synthesis(&mut self, synthesis: LevelSynthesis) {
        self.summaries.push(synthesis);
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Move to `next`, resetting the round and re-anchoring the notes.
    pub(crate) fn enter_level(&mut self, next: Level) {
        self.level = next;
        self.round_step = RoundStep::First;
        self.anchor_at_end();
        self.phase = Phase::Normal;
    }

    fn check_invariants(&self) -> Result<(), SessionInvariantError> {
        if self.level_anchor > self.history.len() {
            return Err(SessionInvariantError::AnchorOutOfRange {
                anchor: self.level_anchor,
                len: self.history.len(),
            });
        }

        let level = self.level.index();
        let expected = match self.phase {
            Phase::Normal => level,
            Phase::AwaitingLevelDecision if !self.level.is_last() => level + 1,
            Phase::AwaitingArchiveChoice | Phase::Finished(_) if self.level.is_last() => {
                Level::ALL.len()
            }
            phase => return Err(SessionInvariantError::PhaseLevel { phase, level }),
        };
        if self.summaries.len() != expected {
            return Err(SessionInvariantError::SummaryCount {
                phase: self.phase,
                level,
                summaries: self.summaries.len(),
            });
        }
        Ok(())
    }
}

/// Wire form of [`RitualSession`]; validated on the way in.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    title: NonEmptyString,
    #[serde(default)]
    offering: String,
    level: Level,
    round_step: RoundStep,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    summaries: Vec<LevelSynthesis>,
    #[serde(default)]
    level_anchor: usize,
    phase: Phase,
}

impl TryFrom<SessionRecord> for RitualSession {
    type Error = SessionInvariantError;

    fn try_from(record: SessionRecord) -> Result<Self, Self::Error> {
        let session = RitualSession {
            title: record.title,
            offering: record.offering,
            level: record.level,
            round_step: record.round_step,
            history: record.history,
            summaries: record.summaries,
            level_anchor: record.level_anchor,
            phase: record.phase,
        };
        session.check_invariants()?;
        Ok(session)
    }
}

impl From<RitualSession> for SessionRecord {
    fn from(session: RitualSession) -> Self {
        SessionRecord {
            title: session.title,
            offering: session.offering,
            level: session.level,
            round_step: session.round_step,
            history: session.history,
            summaries: session.summaries,
            level_anchor: session.level_anchor,
            phase: session.phase,
        }
    }
}
