//! Functions for iterating over and checking the cache.
use std::io::ErrorKind;

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cache::Cache;
use crate::content::path::{self, Kind};
use crate::errors::{IoErrorExt, Result};
use crate::{get, rm};

/// Represents a single key-entry in the cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Address of the key-entry.
    pub key: String,
    /// Size of the stored value in bytes, including the trailing newline.
    pub size: u64,
    /// Whether the entry currently passes the integrity check.
    pub valid: bool,
}

/// Summary of a [`verify`] run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Key-entries examined.
    pub checked: usize,
    /// Key-entries deleted for failing verification.
    pub removed: usize,
}

fn keys(cache: &Cache) -> Result<Vec<(String, u64)>> {
    let root = cache.root();
    cache.check_root()?;
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.io_error().map(|e| e.kind()) == Some(ErrorKind::NotFound) => continue,
            Err(e) => {
                return Err(std::io::Error::from(e))
                    .with_context(|| format!("Failed to list cache directory {}", root.display()))
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some((Kind::Key, key)) = entry.file_name().to_str().and_then(path::classify) {
            if path::check_address(key).is_err() {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            found.push((key.to_owned(), size));
        }
    }
    Ok(found)
}

/// Lists every key-entry in the cache, sorted by address.
pub fn all(cache: &Cache) -> Result<Vec<Entry>> {
    keys(cache)?
        .into_iter()
        .map(|(key, size)| {
            let valid = match get::data(cache, &key) {
                Ok(_) => true,
                Err(e) if e.is_cache_miss() => false,
                Err(e) => return Err(e),
            };
            Ok(Entry { key, size, valid })
        })
        .collect()
}

/// Checks every key-entry and deletes the ones that fail integrity
/// verification. Hash-entries and temp files are left alone.
pub fn verify(cache: &Cache) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();
    for (key, _) in keys(cache)? {
        report.checked += 1;
        match get::data(cache, &key) {
            Ok(_) => {}
            Err(e) if e.is_cache_miss() => {
                warn!("Removing invalid cache entry {}: {}", key, e);
                rm::entry(cache, &key)?;
                report.removed += 1;
            }
            Err(e) => return Err(e),
        }
    }
    debug!(
        "Verified {} entries, removed {}",
        report.checked, report.removed
    );
    Ok(report)
}
