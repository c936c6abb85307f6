//! Atomic file write helpers.
//!
//! Uses a temp file + rename pattern. On platforms where rename-over-existing fails,
//! a backup-and-restore fallback avoids losing the previous contents.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::parent_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSyncPolicy {
    SyncAll,
    SkipSync,
}

#[derive(Debug, Clone, Copy)]
pub struct AtomicWriteOptions {
    /// File sync policy for the temp file before persisting.
    pub file_sync: FileSyncPolicy,
    /// Create missing parent directories before writing.
    pub create_parent: bool,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self {
        Self {
            file_sync: FileSyncPolicy::SyncAll,
            create_parent: true,
        }
    }
}

/// Recover from incomplete atomic writes by restoring `.bak` files.
///
/// If `path` does not exist but `path.bak` does, a crash occurred during the
/// backup-rename window in [`atomic_write_with_options`]. Rename the backup back
/// to the canonical path so the caller can proceed.
pub fn recover_bak_file(path: &Path) {
    let backup = path.with_extension("bak");
    if !path.exists() && backup.exists() {
        match fs::rename(&backup, path) {
            Ok(()) => {
                tracing::warn!(
                    path = %path.display(),
                    "Recovered .bak file from interrupted atomic write"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "Failed to recover .bak file: {e}"
                );
            }
        }
    }
}

pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    atomic_write_with_options(path, bytes, AtomicWriteOptions::default())
}

pub fn atomic_write_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: AtomicWriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);
    if options.create_parent {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if matches!(options.file_sync, FileSyncPolicy::SyncAll) {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        let backup_path = path.with_extension("bak");
        let _ = fs::remove_file(&backup_path);
        fs::rename(path, &backup_path)?;

        if let Err(rename_err) = err.file.persist(path) {
            let _ = fs::rename(&backup_path, path);
            return Err(rename_err.error);
        }
        if let Err(e) = fs::remove_file(&backup_path) {
            tracing::warn!(
                path = %backup_path.display(),
                "Failed to remove .bak after atomic write: {e}"
            );
        }
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Atomic write complete");
    Ok(())
}
