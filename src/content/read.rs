use std::io::ErrorKind;
use std::path::Path;

use crate::errors::{IoErrorExt, Result};

/// Reads an entry file, returning `None` when it doesn't exist. The single
/// trailing newline added on write is stripped.
pub fn read(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(mut data) => {
            if data.last() == Some(&b'\n') {
                data.pop();
            }
            Ok(Some(data))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read cache entry {}", path.display())),
    }
}

/// Returns true if an entry file exists at `path`.
pub fn exists(path: &Path) -> bool {
    path.is_file()
}
