//! The per-principal cache root and scoped temp files.
use std::cell::Cell;
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::content::path::TEMP_PREFIX;
use crate::errors::{Error, IoErrorExt, Result};

const ROOT_PREFIX: &str = "secache-";

/// The OS identity a cache root belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    name: String,
    #[cfg(unix)]
    uid: u32,
}

impl Principal {
    /// The effective user of the running process.
    #[cfg(unix)]
    pub fn current() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail.
        let uid = unsafe { libc::geteuid() };
        Principal {
            name: uid.to_string(),
            uid,
        }
    }

    /// The effective user of the running process.
    #[cfg(not(unix))]
    pub fn current() -> Self {
        let name = std::env::var("USERNAME").unwrap_or_else(|_| String::from("default"));
        Principal {
            name: name
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect(),
        }
    }

    /// Name used in the cache root's directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Some other user, for exercising the ownership checks.
    #[cfg(all(test, unix))]
    pub(crate) fn someone_else() -> Self {
        let uid = Principal::current().uid.wrapping_add(4242);
        Principal {
            name: uid.to_string(),
            uid,
        }
    }
}

/// A handle to one principal's cache root.
///
/// Constructing a `Cache` touches nothing on disk. The directory is created
/// lazily, with owner-only permissions, the first time something is written.
#[derive(Debug)]
pub struct Cache {
    root: PathBuf,
    principal: Principal,
    ready: Cell<bool>,
}

impl Cache {
    /// Resolves the root for the current principal under `base`.
    ///
    /// ## Example
    /// ```no_run
    /// let cache = secache::Cache::for_current_user(std::env::temp_dir());
    /// secache::put::by_string(&cache, "serial", "0123ee")?;
    /// assert_eq!(secache::get::by_string(&cache, "serial")?, "0123ee");
    /// # Ok::<(), secache::Error>(())
    /// ```
    pub fn for_current_user<P: AsRef<Path>>(base: P) -> Self {
        Self::for_principal(base, Principal::current())
    }

    /// Resolves the root for `principal` under `base`.
    pub fn for_principal<P: AsRef<Path>>(base: P, principal: Principal) -> Self {
        let root = base
            .as_ref()
            .join(format!("{}{}", ROOT_PREFIX, principal.name()));
        Cache::at(root, principal)
    }

    /// Uses `root` as-is as the cache directory.
    pub fn at<P: AsRef<Path>>(root: P, principal: Principal) -> Self {
        Cache {
            root: root.as_ref().to_path_buf(),
            principal,
            ready: Cell::new(false),
        }
    }

    /// The cache directory. It may not exist yet.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root if it's absent and makes sure only its owner can get
    /// at it. Idempotent, and only does filesystem work once per handle.
    pub fn init(&self) -> Result<&Path> {
        if !self.ready.get() {
            self.prepare_root()?;
            self.ready.set(true);
        }
        Ok(&self.root)
    }

    /// Forgets that the root was prepared, so the next write recreates it.
    pub(crate) fn invalidate(&self) {
        self.ready.set(false);
    }

    /// Makes sure an existing root belongs to this principal, without
    /// creating or changing anything. An absent root passes.
    /// Reads and deletes go through this first.
    pub fn check_root(&self) -> Result<()> {
        if self.ready.get() {
            return Ok(());
        }
        match std::fs::symlink_metadata(&self.root) {
            Ok(meta) => self.check_owner(&meta),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to inspect cache directory {}", self.root.display())
            }),
        }
    }

    fn check_owner(&self, meta: &std::fs::Metadata) -> Result<()> {
        if !meta.is_dir() {
            return Err(Error::InsecureRoot(
                self.root.clone(),
                "not a directory".into(),
            ));
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if meta.uid() != self.principal.uid {
                return Err(Error::InsecureRoot(
                    self.root.clone(),
                    format!("owned by uid {}, not {}", meta.uid(), self.principal.uid),
                ));
            }
        }
        Ok(())
    }

    fn prepare_root(&self) -> Result<()> {
        let root = &self.root;
        if !root.exists() {
            let mut builder = std::fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                builder.mode(0o700);
            }
            builder
                .create(root)
                .with_context(|| format!("Failed to create cache directory {}", root.display()))?;
            debug!("Created cache directory {}", root.display());
        }

        let meta = std::fs::symlink_metadata(root)
            .with_context(|| format!("Failed to inspect cache directory {}", root.display()))?;
        self.check_owner(&meta)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::{MetadataExt, PermissionsExt};
            if meta.mode() & 0o077 != 0 {
                std::fs::set_permissions(root, std::fs::Permissions::from_mode(0o700))
                    .with_context(|| {
                        format!("Failed to restrict permissions on {}", root.display())
                    })?;
                debug!("Restricted permissions on {}", root.display());
            }
        }
        Ok(())
    }

    /// Creates an empty, uniquely-named file under the cache root. The file
    /// is deleted when the returned handle is dropped.
    pub fn mktemp(&self) -> Result<TempFile> {
        let root = self.init()?;
        let inner = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(root)
            .with_context(|| format!("Failed to create a temp file in {}", root.display()))?;
        debug!("Created temp file {}", inner.path().display());
        Ok(TempFile { inner })
    }
}

/// A scratch file inside the cache root, owned by whoever created it.
///
/// Dropping the handle removes the file, so every exit path cleans up.
pub struct TempFile {
    inner: NamedTempFile,
}

impl TempFile {
    /// Where the file lives. Valid until the handle is dropped.
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Replaces the file's contents with a copy of `source`.
    pub fn fill_from(&mut self, source: &Path) -> Result<u64> {
        let mut src = File::open(source)
            .with_context(|| format!("Failed to open {}", source.display()))?;
        let copied = std::io::copy(&mut src, self.inner.as_file_mut())
            .with_context(|| format!("Failed to stage {}", source.display()))?;
        self.inner
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path().display()))?;
        Ok(copied)
    }
}

impl Write for TempFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
