//! Directory preparation and text reads

use std::fs;

use crate::{Error, NormalizedPath, Result};

/// Make sure `path` exists as a directory, creating parents as needed.
///
/// Returns `true` when the directory had to be created.
pub fn ensure_dir(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();

    if native_path.is_dir() {
        return Ok(false);
    }
    if native_path.exists() {
        return Err(Error::NotADirectory { path: native_path });
    }

    fs::create_dir_all(&native_path).map_err(|e| Error::io(&native_path, e))?;
    tracing::debug!(path = %path, "Created directory");
    Ok(true)
}

/// Whether `path` is a directory with no entries.
pub fn is_empty_dir(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    let mut entries = fs::read_dir(&native_path).map_err(|e| Error::io(&native_path, e))?;
    Ok(entries.next().is_none())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}
