use std::path::{Path, PathBuf};

use crate::digest::Digest;
use crate::errors::{Error, Result};

pub const KEY_PREFIX: &str = "key_";
pub const HASH_PREFIX: &str = "hash_";
pub const TEMP_PREFIX: &str = "temp_";

/// The kinds of file that live directly under a cache root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Key,
    Hash,
    Temp,
}

/// Path of the key-entry addressed by `key`.
pub fn key_path(cache: &Path, key: &str) -> PathBuf {
    cache.join(format!("{}{}", KEY_PREFIX, key))
}

/// Path of the hash-entry addressed by `hash`.
pub fn hash_path(cache: &Path, hash: &Digest) -> PathBuf {
    cache.join(format!("{}{}", HASH_PREFIX, hash))
}

/// Splits a cache file name into its kind and address.
pub fn classify(file_name: &str) -> Option<(Kind, &str)> {
    if let Some(addr) = file_name.strip_prefix(KEY_PREFIX) {
        Some((Kind::Key, addr))
    } else if let Some(addr) = file_name.strip_prefix(HASH_PREFIX) {
        Some((Kind::Hash, addr))
    } else {
        file_name
            .strip_prefix(TEMP_PREFIX)
            .map(|addr| (Kind::Temp, addr))
    }
}

/// Addresses become file names, so they're restricted to a safe alphabet.
pub fn check_address(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{:?} is not a valid cache address",
            key
        )))
    }
}
