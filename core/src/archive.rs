//! The memory archive: one JSON record per line, append-only.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pond_types::{ArchiveChoice, LevelSynthesis};

use crate::session::RitualSession;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("archive record encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("archive line {line} is not a valid record: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One saved memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// UTC, RFC 3339 with second precision and a `Z` suffix.
    pub timestamp: String,
    pub title: String,
    pub offering: String,
    pub summaries: Vec<LevelSynthesis>,
    pub archive_choice: ArchiveChoice,
    pub artifact: String,
}

impl ArchiveRecord {
    #[must_use]
    pub fn from_session(
        session: &RitualSession,
        choice: ArchiveChoice,
        artifact: impl Into<String>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: saved_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            title: session.title().to_string(),
            offering: session.offering().to_string(),
            summaries: session.summaries().to_vec(),
            archive_choice: choice,
            artifact: artifact.into(),
        }
    }
}

/// Destination for saved memories.
pub trait ArchiveStore: Send + Sync {
    fn append(&self, record: &ArchiveRecord) -> Result<(), ArchiveError>;
}

/// Newline-delimited JSON file. Existing lines are never rewritten.
#[derive(Debug, Clone)]
pub struct JsonlArchive {
    path: PathBuf,
}

impl JsonlArchive {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in file order. A missing file is an empty archive.
    pub fn read_all(&self) -> Result<Vec<ArchiveRecord>, ArchiveError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| ArchiveError::Corrupt {
                    line: idx + 1,
                    source,
                })
            })
            .collect()
    }
}

impl ArchiveStore for JsonlArchive {
    fn append(&self, record: &ArchiveRecord) -> Result<(), ArchiveError> {
        let line = serde_json::to_string(record)?;
        pond_utils::append_line(&self.path, &line)?;
        tracing::info!(path = %self.path.display(), title = %record.title, "Archived memory");
        Ok(())
    }
}

/// Result of asking to archive a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The ritual has not reached its end.
    NotFinished,
    /// The player declined to save.
    Discarded,
    /// The record was appended.
    Saved(ArchiveRecord),
    /// Writing failed; the session is unaffected.
    SaveFailed { reason: String },
}

impl ArchiveOutcome {
    /// Short line shown to the player.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            ArchiveOutcome::NotFinished => "Finish the ritual first.".to_string(),
            ArchiveOutcome::Discarded => "Nothing stored, the pond remains still.".to_string(),
            ArchiveOutcome::Saved(_) => "Saved: a small ripple joins the pond archive.".to_string(),
            ArchiveOutcome::SaveFailed { reason } => {
                format!("The pond could not keep this memory: {reason}")
            }
        }
    }
}
