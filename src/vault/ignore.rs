//! Ignore-file patching for the key file.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::errors::Result;

/// Append `entry` on its own line to the ignore-file at `path`.
///
/// Creates the file if it doesn't exist.  Entries are not deduplicated;
/// setup only calls this when it creates a new key file.
pub fn append_entry(path: &Path, entry: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    write!(file, "\n{entry}\n")?;
    file.flush()?;
    Ok(())
}
