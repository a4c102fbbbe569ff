//! Functions for removing things from the cache.
use std::io::ErrorKind;

use tracing::debug;
use walkdir::WalkDir;

use crate::cache::Cache;
use crate::content::{path, rm};
use crate::errors::{IoErrorExt, Result};

/// Removes a single key-entry. Its hash-entry is left intact and may still
/// be shared with other keys.
pub fn entry<K: AsRef<str>>(cache: &Cache, key: K) -> Result<()> {
    let key = key.as_ref();
    path::check_address(key)?;
    cache.check_root()?;
    rm::rm(&path::key_path(cache.root(), key))
}

/// Removes every key-entry, hash-entry and temp file, then the cache root
/// itself.
///
/// A missing root is not an error, and neither is a root that still holds
/// files this crate didn't put there; it's simply left behind.
///
/// ## Example
/// ```no_run
/// let cache = secache::Cache::for_current_user("/tmp");
/// secache::put::data(&cache, "k1", "abc")?;
/// secache::rm::all(&cache)?;
/// assert!(secache::get::data(&cache, "k1").is_err());
/// secache::rm::all(&cache)?;
/// # Ok::<(), secache::Error>(())
/// ```
pub fn all(cache: &Cache) -> Result<()> {
    let root = cache.root();
    cache.invalidate();
    cache.check_root()?;
    if !root.is_dir() {
        return Ok(());
    }
    let mut removed = 0usize;
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            // Vanished underneath us.
            Err(e) if e.io_error().map(|e| e.kind()) == Some(ErrorKind::NotFound) => continue,
            Err(e) => {
                return Err(std::io::Error::from(e))
                    .with_context(|| format!("Failed to list cache directory {}", root.display()))
            }
        };
        let ours = entry
            .file_name()
            .to_str()
            .and_then(path::classify)
            .is_some();
        if ours && !entry.file_type().is_dir() {
            rm::rm(entry.path())?;
            removed += 1;
        }
    }
    match std::fs::remove_dir(root) {
        Ok(()) => debug!("Removed {} entries and {}", removed, root.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => debug!(
            "Removed {} entries, left {} in place: {}",
            removed,
            root.display(),
            e
        ),
    }
    Ok(())
}
