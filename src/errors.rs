use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error type returned by all API calls.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Returned when there is no key-entry for a key in the cache.
    #[error("Entry not found for key {1:?} in cache {0:?}")]
    #[diagnostic(code(secache::not_found))]
    NotFound(PathBuf, String),

    /// Returned when a key-entry exists but its paired hash-entry does not.
    /// Usually the leftover of an interrupted write.
    #[error("Key entry {0} has no matching hash entry {1}")]
    #[diagnostic(code(secache::integrity_missing))]
    IntegrityMissing(String, String),

    /// Returned when a key-entry and its hash-entry disagree on the stored
    /// value. This indicates corruption rather than ordinary absence.
    #[error("Key entry {0} does not match hash entry {1}")]
    #[diagnostic(
        code(secache::integrity_mismatch),
        help("The cache is corrupted. Run `secache verify` or `secache clear-cache`.")
    )]
    IntegrityMismatch(String, String),

    /// Returned when caller-supplied input fails validation.
    #[error("Invalid input: {0}")]
    #[diagnostic(code(secache::invalid_input))]
    InvalidInput(String),

    /// Returned when a device identifier does not name a known oracle.
    #[error("Unsupported device: {0:?}")]
    #[diagnostic(
        code(secache::unsupported_device),
        help("Supported devices are atecc508, atecc608 and se050.")
    )]
    UnsupportedDevice(String),

    /// Returned when the oracle command exits unsuccessfully.
    #[error("Command `{command}` failed with {status}")]
    #[diagnostic(code(secache::command_failed))]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// How it exited.
        status: String,
    },

    /// Returned when the oracle command could not be started at all.
    #[error("Failed to run `{1}`")]
    #[diagnostic(
        code(secache::command_spawn),
        help("Check that the oracle program is installed, or point --oracle at it.")
    )]
    CommandSpawn(#[source] std::io::Error, String),

    /// Returned when the oracle printed something that isn't UTF-8.
    #[error("Command `{0}` produced non-UTF-8 output")]
    #[diagnostic(code(secache::invalid_output))]
    InvalidOutput(String),

    /// Returned when the cache root exists but cannot be trusted.
    #[error("Refusing to use cache directory {0:?}: {1}")]
    #[diagnostic(code(secache::insecure_root))]
    InsecureRoot(PathBuf, String),

    /// Returned when a general IO error has occurred.
    #[error("{1}")]
    #[diagnostic(code(secache::io_error))]
    IoError(#[source] std::io::Error, String),

    /// Returned when there's an error serializing a listing.
    #[error(transparent)]
    #[diagnostic(code(secache::serde_error))]
    SerdeError(#[from] serde_json::Error),
}

impl Error {
    /// True for the read failures a memoizing caller recovers from by
    /// recomputing the value.
    pub fn is_cache_miss(&self) -> bool {
        matches!(
            self,
            Error::NotFound(..) | Error::IntegrityMissing(..) | Error::IntegrityMismatch(..)
        )
    }
}

/// The result type returned by calls to this library
pub type Result<T> = std::result::Result<T, Error>;

pub trait IoErrorExt<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> IoErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        match self {
            Ok(t) => Ok(t),
            Err(e) => Err(Error::IoError(e, f())),
        }
    }
}
