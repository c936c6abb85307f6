//! Session persistence keyed by [`SessionId`].
//!
//! Storing `None` under an id is how a session is reset: the id stays known,
//! but the next interaction starts a fresh ritual.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use pond_types::SessionId;

use crate::session::RitualSession;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("session store encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait SessionStore {
    /// The stored session, or `None` when the id is unknown or was reset.
    fn get(&self, id: &SessionId) -> Option<RitualSession>;

    /// Replace the entry for `id`. `None` resets it.
    fn put(&mut self, id: &SessionId, session: Option<RitualSession>) -> Result<(), StoreError>;

    /// Ids with an entry, including reset ones.
    fn ids(&self) -> Vec<SessionId>;
}

/// Process-local store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: HashMap<SessionId, Option<RitualSession>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &SessionId) -> Option<RitualSession> {
        self.sessions.get(id).cloned().flatten()
    }

    fn put(&mut self, id: &SessionId, session: Option<RitualSession>) -> Result<(), StoreError> {
        self.sessions.insert(id.clone(), session);
        Ok(())
    }

    fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// All sessions in one JSON object, rewritten atomically on every `put`.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    sessions: BTreeMap<SessionId, Option<RitualSession>>,
}

impl JsonFileSessionStore {
    /// Load the store at `path`.
    ///
    /// A missing file is an empty store. An unreadable or non-object file is
    /// logged and treated as empty; an individual entry that no longer decodes
    /// is logged and loaded as reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        pond_utils::recover_bak_file(&path);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let sessions = if raw.trim().is_empty() {
            BTreeMap::new()
        } else {
            decode_sessions(&path, &raw)
        };

        tracing::debug!(path = %path.display(), count = sessions.len(), "Loaded session store");
        Ok(Self { path, sessions })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&self.sessions)?;
        pond_utils::atomic_write(&self.path, &json)?;
        Ok(())
    }
}

fn decode_sessions(path: &Path, raw: &str) -> BTreeMap<SessionId, Option<RitualSession>> {
    let entries: BTreeMap<SessionId, serde_json::Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Session store is unreadable, starting empty: {e}");
            return BTreeMap::new();
        }
    };

    entries
        .into_iter()
        .map(|(id, value)| {
            let session = serde_json::from_value::<Option<RitualSession>>(value).unwrap_or_else(|e| {
                tracing::warn!(session = %id, "Discarding undecodable session: {e}");
                None
            });
            (id, session)
        })
        .collect()
}

impl SessionStore for JsonFileSessionStore {
    fn get(&self, id: &SessionId) -> Option<RitualSession> {
        self.sessions.get(id).cloned().flatten()
    }

    fn put(&mut self, id: &SessionId, session: Option<RitualSession>) -> Result<(), StoreError> {
        let previous = self.sessions.insert(id.clone(), session);
        if let Err(e) = self.persist() {
            match previous {
                Some(previous) => self.sessions.insert(id.clone(), previous),
                None => self.sessions.remove(id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }
}
