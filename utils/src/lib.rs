//! Shared file persistence utilities for Memory Pond.
//!
//! - **`atomic_write`**: Crash-safe whole-file rewrites (temp + rename)
//! - **`append`**: Append-only line files (newline-delimited records)

pub mod append;
pub mod atomic_write;

pub use append::append_line;
pub use atomic_write::{AtomicWriteOptions, FileSyncPolicy, atomic_write, atomic_write_with_options, recover_bak_file};

use std::fs;
use std::io;
use std::path::Path;

/// Directory that will contain `path`, with `""` normalized to `"."`.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    let parent = parent_dir(path);
    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
