//! Secure element adapters.
//!
//! Each operation validates its input, then makes exactly one memoized call
//! to the device's command-line tool. Malformed input is rejected before the
//! cache is touched.
use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use tracing::debug;

use crate::cache::Cache;
use crate::errors::{Error, IoErrorExt, Result};
use crate::exec::{self, KeySpace};

/// The closed set of supported oracles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Device {
    /// Microchip ATECC508A/608A. Signs SHA-256 digests.
    Atecc608,
    /// NXP SE050. Signs SHA-384 digests, read from a staged file.
    Se050,
}

impl Device {
    /// Classifies a device identifier.
    pub fn classify(id: &str) -> Result<Device> {
        match id.trim().to_ascii_lowercase().as_str() {
            "atecc" | "atecc508" | "atecc508a" | "atecc608" | "atecc608a" => Ok(Device::Atecc608),
            "se050" | "se05x" => Ok(Device::Se050),
            _ => Err(Error::UnsupportedDevice(id.into())),
        }
    }

    /// Canonical identifier, also used to namespace cache keys.
    pub fn name(&self) -> &'static str {
        match self {
            Device::Atecc608 => "atecc608",
            Device::Se050 => "se050",
        }
    }

    /// The command-line tool that talks to the device.
    pub fn program(&self) -> &'static str {
        match self {
            Device::Atecc608 => "atecc",
            Device::Se050 => "se05x",
        }
    }

    /// Number of hex characters in a digest this device will sign.
    pub fn hash_len(&self) -> usize {
        match self {
            Device::Atecc608 => 64,
            Device::Se050 => 96,
        }
    }

    fn stages_hash(&self) -> bool {
        matches!(self, Device::Se050)
    }

    /// Rejects anything that isn't a hex digest of the right length.
    pub fn check_hash(&self, hash: &str) -> Result<()> {
        if hash.is_empty() || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidInput(format!(
                "hash must be hexadecimal, got {:?}",
                hash
            )));
        }
        if hash.len() != self.hash_len() {
            return Err(Error::InvalidInput(format!(
                "{} expects a {}-character hash, got {}",
                self.name(),
                self.hash_len(),
                hash.len()
            )));
        }
        Ok(())
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Device::classify(s)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A device bound to a cache and to the program used to reach it.
pub struct Oracle<'a> {
    device: Device,
    program: OsString,
    cache: &'a Cache,
}

impl<'a> Oracle<'a> {
    /// Talks to `device` through its default tool, caching in `cache`.
    pub fn new(device: Device, cache: &'a Cache) -> Self {
        Oracle {
            device,
            program: device.program().into(),
            cache,
        }
    }

    /// Uses `program` instead of the device's default tool.
    pub fn program<P: Into<OsString>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Reads the device serial number.
    pub fn serial_number(&self) -> Result<String> {
        let key = format!("{}:serial-number", self.device);
        exec::run(
            self.cache,
            KeySpace::ByString(&key),
            &self.program,
            ["serial"],
        )
    }

    /// Reads the device MAC address.
    pub fn mac_address(&self) -> Result<String> {
        let key = format!("{}:mac-address", self.device);
        exec::run(self.cache, KeySpace::ByString(&key), &self.program, ["mac"])
    }

    /// Signs a hex digest. Each distinct digest gets its own cache slot,
    /// regardless of how the caller capitalized it.
    pub fn sign_hash(&self, hash: &str) -> Result<String> {
        self.device.check_hash(hash)?;
        let hash = hash.to_ascii_lowercase();
        let hash = hash.as_str();
        if !self.device.stages_hash() {
            return exec::run(
                self.cache,
                KeySpace::ByString(hash),
                &self.program,
                ["sign-hash", hash],
            );
        }
        exec::memoize(self.cache, KeySpace::ByString(hash), || {
            let mut staged = self.cache.mktemp()?;
            staged
                .write_all(hash.as_bytes())
                .and_then(|_| staged.flush())
                .with_context(|| format!("Failed to stage hash in {}", staged.path().display()))?;
            debug!("Staged hash in {}", staged.path().display());
            exec::output(
                Command::new(&self.program)
                    .arg("sign-hash")
                    .arg("--input")
                    .arg(staged.path()),
            )
        })
    }

    /// Signs a file's contents. The file is snapshotted into the cache root
    /// first, so the bytes that are digested are the bytes that are signed.
    pub fn sign_file<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        match std::fs::File::open(path) {
            Ok(fd) if fd.metadata().map(|m| m.is_file()).unwrap_or(false) => {}
            Ok(_) => {
                return Err(Error::InvalidInput(format!(
                    "{} is not a regular file",
                    path.display()
                )))
            }
            Err(e) => {
                return Err(Error::InvalidInput(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        }
        let mut staged = self.cache.mktemp()?;
        staged.fill_from(path)?;
        let snapshot = staged.path();
        exec::run(
            self.cache,
            KeySpace::ByFile(snapshot),
            &self.program,
            [OsString::from("sign-file"), snapshot.as_os_str().to_owned()],
        )
    }
}
