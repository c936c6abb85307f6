//! Append-only line files.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use crate::ensure_parent_dir;

/// Append `line` plus a trailing newline to `path`, creating the file and its
/// parent directory when missing.
///
/// `line` must not contain a newline; each call produces exactly one record.
pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    if line.contains('\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "record must fit on a single line",
        ));
    }
    ensure_parent_dir(path)?;

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    file.write_all(buf.as_bytes())?;
    file.flush()?;
    file.sync_all()
}
