//! Functions for reading from cache.
use std::path::Path;

use tracing::debug;

use crate::cache::Cache;
use crate::content::{path, read};
use crate::digest::{self, Digest};
use crate::errors::{Error, Result};

/// Reads the value stored under `key`, verifying it against its hash-entry.
///
/// Fails with [`Error::NotFound`] when there is no key-entry,
/// [`Error::IntegrityMissing`] when the paired hash-entry is gone, and
/// [`Error::IntegrityMismatch`] when the two disagree. A root owned by
/// someone else is refused with [`Error::InsecureRoot`] before anything in
/// it is read.
///
/// ## Example
/// ```no_run
/// let cache = secache::Cache::for_current_user("/tmp");
/// secache::put::data(&cache, "k1", "abc")?;
/// assert_eq!(secache::get::data(&cache, "k1")?, "abc");
/// # Ok::<(), secache::Error>(())
/// ```
pub fn data<K: AsRef<str>>(cache: &Cache, key: K) -> Result<String> {
    let key = key.as_ref();
    path::check_address(key)?;
    cache.check_root()?;
    let root = cache.root();

    let value = match read::read(&path::key_path(root, key))? {
        Some(value) => value,
        None => return Err(Error::NotFound(root.to_path_buf(), key.into())),
    };

    let hash = digest::of(&value);
    match read::read(&path::hash_path(root, &hash))? {
        None => Err(Error::IntegrityMissing(key.into(), hash.to_string())),
        Some(stored) if stored != value => {
            Err(Error::IntegrityMismatch(key.into(), hash.to_string()))
        }
        Some(_) => {
            debug!("Read {} bytes from key {}", value.len(), key);
            // put only ever writes UTF-8, so anything else was planted.
            String::from_utf8(value)
                .map_err(|_| Error::IntegrityMismatch(key.into(), hash.to_string()))
        }
    }
}

/// Reads the value addressed by the digest of `input`.
pub fn by_string<S: AsRef<str>>(cache: &Cache, input: S) -> Result<String> {
    data(cache, digest::of(input.as_ref()))
}

/// Reads the value addressed by the digest of the contents of the file at
/// `input`.
pub fn by_file<P: AsRef<Path>>(cache: &Cache, input: P) -> Result<String> {
    data(cache, digest::of_file(input)?)
}

/// Returns true if a hash-entry for `hash` exists in the cache.
pub fn hash_exists(cache: &Cache, hash: &Digest) -> bool {
    read::exists(&path::hash_path(cache.root(), hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::put;

    fn setup() -> (tempfile::TempDir, Cache) {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::for_current_user(tmp.path());
        (tmp, cache)
    }

    #[test]
    fn round_trip() {
        let (_tmp, cache) = setup();
        for value in ["abc", "", "two\nlines", "trailing\n", "\n\n", "ünïcödé"] {
            put::data(&cache, "k1", value).unwrap();
            assert_eq!(data(&cache, "k1").unwrap(), value);
        }
    }

    #[test]
    fn missing_root_is_not_found() {
        let (_tmp, cache) = setup();
        assert!(matches!(data(&cache, "k1"), Err(Error::NotFound(..))));
        assert!(!cache.root().exists());
    }

    #[test]
    fn missing_key_is_not_found() {
        let (_tmp, cache) = setup();
        put::data(&cache, "k1", "abc").unwrap();
        assert!(matches!(data(&cache, "k2"), Err(Error::NotFound(..))));
    }

    #[test]
    fn tampered_key_entry_is_mismatch() {
        let (_tmp, cache) = setup();
        put::data(&cache, "k1", "abc").unwrap();
        assert_eq!(data(&cache, "k1").unwrap(), "abc");

        put::data(&cache, "k1", "abc").unwrap();
        // Make "abX" look like it has a hash-entry, but with other bytes.
        let forged = digest::of("abX");
        std::fs::write(path::hash_path(cache.root(), &forged), b"abY\n").unwrap();
        std::fs::write(path::key_path(cache.root(), "k1"), b"abX\n").unwrap();
        assert!(matches!(
            data(&cache, "k1"),
            Err(Error::IntegrityMismatch(..))
        ));
    }

    #[test]
    fn rewritten_key_entry_never_returns_stale_value() {
        let (_tmp, cache) = setup();
        put::data(&cache, "k1", "abc").unwrap();
        std::fs::write(path::key_path(cache.root(), "k1"), b"abX\n").unwrap();
        let err = data(&cache, "k1").unwrap_err();
        assert!(err.is_cache_miss());
        assert!(matches!(err, Error::IntegrityMissing(..)));
    }

    #[test]
    fn corrupted_hash_entry_is_mismatch() {
        let (_tmp, cache) = setup();
        let hash = put::data(&cache, "k1", "abc").unwrap();
        std::fs::write(path::hash_path(cache.root(), &hash), b"abX\n").unwrap();
        assert!(matches!(
            data(&cache, "k1"),
            Err(Error::IntegrityMismatch(..))
        ));
    }

    #[test]
    fn deleted_hash_entry_is_missing() {
        let (_tmp, cache) = setup();
        let hash = put::data(&cache, "k1", "abc").unwrap();
        assert!(hash_exists(&cache, &hash));
        std::fs::remove_file(path::hash_path(cache.root(), &hash)).unwrap();
        assert!(!hash_exists(&cache, &hash));
        assert!(matches!(
            data(&cache, "k1"),
            Err(Error::IntegrityMissing(..))
        ));
    }

    #[test]
    fn interrupted_write_fails_closed() {
        let (_tmp, cache) = setup();
        cache.init().unwrap();
        // Only the key-entry made it to disk.
        std::fs::write(path::key_path(cache.root(), "k1"), b"abc\n").unwrap();
        assert!(matches!(
            data(&cache, "k1"),
            Err(Error::IntegrityMissing(..))
        ));
        // The next put heals it.
        put::data(&cache, "k1", "abc").unwrap();
        assert_eq!(data(&cache, "k1").unwrap(), "abc");
    }

    #[test]
    fn string_and_file_share_addresses() {
        let (tmp, cache) = setup();
        let input = tmp.path().join("input");
        std::fs::write(&input, b"payload").unwrap();
        put::by_string(&cache, "payload", "signed").unwrap();
        assert_eq!(by_file(&cache, &input).unwrap(), "signed");

        put::by_file(&cache, &input, "resigned").unwrap();
        assert_eq!(by_string(&cache, "payload").unwrap(), "resigned");
    }
}
