//! Runtime configuration
//!
//! Loaded once at startup, then split into the immutable pieces each
//! component needs (profile table, store directory, control policy).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SpoofError};
use crate::iface::{Backend, Elevation, SystemControl};
use crate::profile::{DeviceProfile, ProfileTable, BUILTIN_PROFILES};
use crate::store::AddressStore;

/// Complete tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacshiftConfig {
    /// Directory holding `.original_mac_<iface>.txt` records
    pub state_dir: PathBuf,

    /// OS tool used to query and change addresses
    pub backend: Backend,

    /// Privilege escalation policy for mutating commands
    pub elevation: Elevation,

    /// Device types available to `--device-type`
    pub profiles: Vec<DeviceProfile>,
}

impl Default for MacshiftConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("."),
            backend: Backend::default(),
            elevation: Elevation::default(),
            profiles: BUILTIN_PROFILES
                .iter()
                .map(|(name, prefix)| DeviceProfile {
                    name: (*name).to_string(),
                    prefix: (*prefix).to_string(),
                })
                .collect(),
        }
    }
}

impl MacshiftConfig {
    /// Create a new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpoofError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SpoofError::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    /// Save configuration to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SpoofError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| SpoofError::Config(format!("Failed to write config: {e}")))
    }

    /// Profile table for the synthesizer
    #[must_use]
    pub fn profile_table(&self) -> ProfileTable {
        ProfileTable::from(self.profiles.clone())
    }

    /// Store rooted at [`state_dir`](Self::state_dir)
    #[must_use]
    pub fn address_store(&self) -> AddressStore {
        AddressStore::new(&self.state_dir)
    }

    /// OS-backed interface control
    #[must_use]
    pub fn system_control(&self) -> SystemControl {
        SystemControl::new(self.backend, self.elevation)
    }
}
