use std::io::ErrorKind;
use std::path::Path;

use crate::errors::{IoErrorExt, Result};

/// Removes a single entry file. Already-absent files are not an error.
pub fn rm(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
