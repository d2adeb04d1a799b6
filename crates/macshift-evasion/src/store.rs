//! Original-address store
//!
//! Keeps exactly one record per interface: a file named
//! `.original_mac_<iface>.txt` whose whole content is the canonical MAC
//! string. There is no history and no locking; concurrent writers on the
//! same interface race and the last write wins.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, SpoofError};
use crate::mac::MacAddress;

const RECORD_PREFIX: &str = ".original_mac_";
const RECORD_SUFFIX: &str = ".txt";

/// A network interface name restricted to `[A-Za-z0-9_-]+`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Validate an interface name
    ///
    /// # Errors
    ///
    /// Returns [`SpoofError::InvalidInterface`] for empty names or names with
    /// any character outside letters, digits, `_` and `-`
    pub fn parse(name: &str) -> Result<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(SpoofError::InvalidInterface(name.to_string()))
        }
    }

    /// The name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for InterfaceName {
    type Err = SpoofError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// File-backed store of the address each interface had before spoofing
#[derive(Debug, Clone)]
pub struct AddressStore {
    dir: PathBuf,
}

impl AddressStore {
    /// Create a store rooted at `dir`; the directory is created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the record files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic record path for an interface
    #[must_use]
    pub fn record_path(&self, interface: &InterfaceName) -> PathBuf {
        self.dir
            .join(format!("{RECORD_PREFIX}{interface}{RECORD_SUFFIX}"))
    }

    /// Save `mac` as the original address of `interface`, replacing any
    /// previous record
    ///
    /// # Errors
    ///
    /// Returns [`SpoofError::Persistence`] if the directory or file cannot be
    /// written. After a failure the previous record may or may not survive.
    pub fn save(&self, interface: &InterfaceName, mac: &MacAddress) -> Result<PathBuf> {
        let path = self.record_path(interface);

        if !self.dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.dir).map_err(|e| {
                SpoofError::Persistence(format!(
                    "could not create {}: {e}",
                    self.dir.display()
                ))
            })?;
        }

        fs::write(&path, mac.to_string()).map_err(|e| {
            log::error!("Could not save original MAC to {}: {e}", path.display());
            SpoofError::Persistence(format!(
                "could not save original MAC address to {}: {e}",
                path.display()
            ))
        })?;

        log::info!(
            "Original MAC address {mac} for {interface} saved to {}",
            path.display()
        );
        Ok(path)
    }

    /// Read the saved original address, if there is a usable one
    ///
    /// A missing, empty or unparsable record reads as `None`; I/O errors are
    /// logged and also read as `None`.
    #[must_use]
    pub fn read(&self, interface: &InterfaceName) -> Option<MacAddress> {
        let path = self.record_path(interface);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::error!(
                    "Could not read original MAC address from {}: {e}",
                    path.display()
                );
                return None;
            }
        };

        let content = content.trim();
        if content.is_empty() {
            log::warn!("Original MAC file {} is empty", path.display());
            return None;
        }

        match content.parse() {
            Ok(mac) => Some(mac),
            Err(e) => {
                log::warn!("Original MAC file {} is unusable: {e}", path.display());
                None
            }
        }
    }

    /// Remove the record for `interface`
    ///
    /// Returns `Ok(true)` if a record was removed and `Ok(false)` if there was
    /// none. Callers treat an error as a warning, not a failure.
    ///
    /// # Errors
    ///
    /// Returns [`SpoofError::Persistence`] if an existing record could not be
    /// removed
    pub fn delete(&self, interface: &InterfaceName) -> Result<bool> {
        let path = self.record_path(interface);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Cleaned up original MAC file: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => {
                log::warn!(
                    "Could not remove original MAC file {}: {e}",
                    path.display()
                );
                Err(SpoofError::Persistence(format!(
                    "could not remove original MAC file {}: {e}",
                    path.display()
                )))
            }
        }
    }
}
