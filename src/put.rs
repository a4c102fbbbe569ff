//! Functions for writing to cache.
use std::path::Path;

use tracing::debug;

use crate::cache::Cache;
use crate::content::{path, write};
use crate::digest::{self, Digest};
use crate::errors::Result;

/// Writes `value` to the `cache`, addressed by `key`. Returns the digest of
/// `value`, which is the address of the record's hash-entry.
///
/// The hash-entry is always written before the key-entry, so a key-entry
/// that survives an interrupted write has nothing to validate against and
/// reads back as a miss.
///
/// ## Example
/// ```no_run
/// let cache = secache::Cache::for_current_user("/tmp");
/// let hash = secache::put::data(&cache, "k1", "abc")?;
/// assert_eq!(hash, secache::digest::of("abc"));
/// # Ok::<(), secache::Error>(())
/// ```
pub fn data<K: AsRef<str>>(cache: &Cache, key: K, value: &str) -> Result<Digest> {
    let key = key.as_ref();
    path::check_address(key)?;
    let root = cache.init()?;
    let hash = digest::of(value);
    write::write(root, &path::hash_path(root, &hash), value)?;
    write::write(root, &path::key_path(root, key), value)?;
    debug!("Stored {} bytes under key {} (hash {})", value.len(), key, hash);
    Ok(hash)
}

/// Writes `value`, addressed by the digest of `input`.
pub fn by_string<S: AsRef<str>>(cache: &Cache, input: S, value: &str) -> Result<Digest> {
    data(cache, digest::of(input.as_ref()), value)
}

/// Writes `value`, addressed by the digest of the contents of the file at
/// `input`.
pub fn by_file<P: AsRef<Path>>(cache: &Cache, input: P, value: &str) -> Result<Digest> {
    data(cache, digest::of_file(input)?, value)
}
