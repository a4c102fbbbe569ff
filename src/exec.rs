//! Memoized execution of external commands.
//!
//! A cache hit never runs the command. A miss of any kind (absent, or
//! present but failing its integrity check) runs it once and stores what it
//! printed; a failed run stores nothing.
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::cache::Cache;
use crate::digest::{self, Digest};
use crate::errors::{Error, Result};
use crate::{get, put};

/// How a cache slot is derived from the caller's input.
#[derive(Clone, Copy, Debug)]
pub enum KeySpace<'a> {
    /// Keyed by the digest of a string.
    ByString(&'a str),
    /// Keyed by the digest of a file's contents.
    ByFile(&'a Path),
}

impl KeySpace<'_> {
    /// The key-entry address for this input.
    pub fn address(&self) -> Result<Digest> {
        match self {
            KeySpace::ByString(input) => Ok(digest::of(input)),
            KeySpace::ByFile(path) => digest::of_file(path),
        }
    }
}

/// Returns the cached value for `key`, or calls `compute` and caches its
/// result. `compute` runs at most once and isn't called at all on a hit.
pub fn memoize<F>(cache: &Cache, key: KeySpace<'_>, compute: F) -> Result<String>
where
    F: FnOnce() -> Result<String>,
{
    let address = key.address()?;
    match get::data(cache, &address) {
        Ok(value) => {
            debug!("Cache hit for {}", address);
            return Ok(value);
        }
        Err(e @ Error::InsecureRoot(..)) => return Err(e),
        Err(e @ Error::IntegrityMismatch(..)) => warn!("Ignoring corrupted cache entry: {}", e),
        Err(e) if e.is_cache_miss() => debug!("Cache miss for {}: {}", address, e),
        Err(e) => warn!("Failed to read cache entry {}, recomputing: {}", address, e),
    }
    let value = compute()?;
    if let Err(e) = put::data(cache, &address, &value) {
        // The answer is still good, it just won't be remembered.
        warn!("Failed to cache result for {}: {}", address, e);
    }
    Ok(value)
}

/// Runs `program` with `args` through the cache, returning its standard
/// output with trailing newlines trimmed.
///
/// ## Example
/// ```no_run
/// use secache::exec::{self, KeySpace};
///
/// let cache = secache::Cache::for_current_user("/tmp");
/// let serial = exec::run(&cache, KeySpace::ByString("serial"), "atecc", ["serial"])?;
/// println!("{}", serial);
/// # Ok::<(), secache::Error>(())
/// ```
pub fn run<P, I, S>(cache: &Cache, key: KeySpace<'_>, program: P, args: I) -> Result<String>
where
    P: AsRef<OsStr>,
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args);
    memoize(cache, key, || output(&mut cmd))
}

/// Executes `cmd`, capturing stdout. stderr goes straight through to ours.
pub fn output(cmd: &mut Command) -> Result<String> {
    let described = describe(cmd);
    debug!("Executing: {}", described);
    let out = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| Error::CommandSpawn(e, described.clone()))?;
    if !out.status.success() {
        return Err(Error::CommandFailed {
            command: described,
            status: out.status.to_string(),
        });
    }
    let mut text = String::from_utf8(out.stdout).map_err(|_| Error::InvalidOutput(described))?;
    let trimmed = text.trim_end_matches(['\n', '\r']).len();
    text.truncate(trimmed);
    Ok(text)
}

fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
