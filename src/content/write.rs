use std::io::prelude::*;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::content::path::TEMP_PREFIX;
use crate::errors::{IoErrorExt, Result};

/// Stages an entry in a temp file next to its destination and renames it
/// into place on `close`, so readers see either the old or the new file.
pub struct Writer {
    target: PathBuf,
    tmpfile: NamedTempFile,
}

impl Writer {
    pub fn new(cache: &Path, target: &Path) -> Result<Writer> {
        Ok(Writer {
            target: target.to_path_buf(),
            tmpfile: tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .tempfile_in(cache)
                .with_context(|| {
                    format!("Failed to create a temp file in {}", cache.display())
                })?,
        })
    }

    pub fn close(mut self) -> Result<()> {
        let target = self.target;
        self.tmpfile
            .flush()
            .with_context(|| format!("Failed to flush staged entry for {}", target.display()))?;
        self.tmpfile
            .persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to move staged entry to {}", target.display()))?;
        Ok(())
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.tmpfile.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.tmpfile.flush()
    }
}

/// Writes `value` plus a trailing newline to `target`, replacing whatever
/// was there.
pub fn write(cache: &Path, target: &Path, value: &str) -> Result<()> {
    let mut writer = Writer::new(cache, target)?;
    writer
        .write_all(value.as_bytes())
        .and_then(|_| writer.write_all(b"\n"))
        .with_context(|| format!("Failed to write cache entry {}", target.display()))?;
    writer.close()
}
