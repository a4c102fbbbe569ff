//! Digest derivation for cache addresses.
//!
//! Every address in the cache is the lowercase hex SHA-256 of something:
//! the logical input for a key-entry, the stored value for a hash-entry.
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use digest::Digest as _;
use sha2::Sha256;

use crate::errors::{IoErrorExt, Result};

const BUF_SIZE: usize = 16 * 1024;

/// A fixed-length lowercase hexadecimal SHA-256 digest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    /// The digest as lowercase hex.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digests an in-memory byte string.
///
/// ## Example
/// ```
/// let d = secache::digest::of("hello");
/// assert_eq!(
///     d.as_str(),
///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
/// );
/// ```
pub fn of<B: AsRef<[u8]>>(bytes: B) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    Digest(hex::encode(hasher.finalize()))
}

/// Digests the contents of a file, streaming it from disk. A file yields the
/// same digest as a string holding the same bytes.
pub fn of_file<P: AsRef<Path>>(path: P) -> Result<Digest> {
    fn inner(path: &Path) -> Result<Digest> {
        let mut fd = File::open(path)
            .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
        let mut hasher = Sha256::new();
        let mut buf = [0; BUF_SIZE];
        loop {
            let amt = fd
                .read(&mut buf)
                .with_context(|| format!("Failed to read {} for hashing", path.display()))?;
            if amt == 0 {
                break;
            }
            hasher.update(&buf[..amt]);
        }
        Ok(Digest(hex::encode(hasher.finalize())))
    }
    inner(path.as_ref())
}
