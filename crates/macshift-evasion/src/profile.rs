//! Device profile table
//!
//! Maps a device-type name to the 3-octet vendor prefix used when
//! generating an address that looks like that kind of device. The table is
//! built once at startup and handed to the [`Synthesizer`](crate::Synthesizer)
//! by value; nothing mutates it afterwards.
//!
//! Prefixes are kept as text and decoded on lookup, so an entry such as
//! `"XX:YY"` can exist in a configuration file and is reported as
//! [`Lookup::Malformed`] instead of failing at load time.
//!
//! ```
//! use macshift_evasion::profile::{Lookup, ProfileTable};
//!
//! let table = ProfileTable::builtin();
//! assert_eq!(table.decode_prefix("phone"), Lookup::Found([0x8C, 0x2D, 0xAA]));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Built-in device types and their prefixes
pub const BUILTIN_PROFILES: &[(&str, &str)] = &[
    ("smartwatch", "00:1A:7D"),
    ("earbuds", "40:4E:36"),
    ("desktop", "00:1B:63"),
    ("phone", "8C:2D:AA"),
];

/// One named device type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Device-type name, matched case-insensitively
    pub name: String,
    /// Vendor prefix as written, expected to be `XX:XX:XX`
    pub prefix: String,
}

/// Result of looking a device type up in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Known profile with a well-formed prefix
    Found([u8; 3]),
    /// No profile by that name
    Unknown,
    /// Profile exists but its prefix does not decode to 3 octets
    Malformed(String),
}

/// Immutable name → prefix table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileTable {
    entries: BTreeMap<String, String>,
}

impl ProfileTable {
    /// The four device types shipped with the tool
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_PROFILES.iter().copied())
    }

    /// Build a table from `(name, prefix)` pairs; later duplicates win
    pub fn from_pairs<N, P>(pairs: impl IntoIterator<Item = (N, P)>) -> Self
    where
        N: Into<String>,
        P: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(name, prefix)| (name.into().to_lowercase(), prefix.into()))
            .collect();
        Self { entries }
    }

    /// Look up a device type and decode its prefix
    #[must_use]
    pub fn decode_prefix(&self, name: &str) -> Lookup {
        match self.entries.get(&name.to_lowercase()) {
            None => Lookup::Unknown,
            Some(prefix) => match decode(prefix) {
                Ok(oui) => Lookup::Found(oui),
                Err(reason) => Lookup::Malformed(reason),
            },
        }
    }

    /// Check whether a device type is present, regardless of prefix validity
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    /// Device-type names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// All profiles in sorted order
    #[must_use]
    pub fn profiles(&self) -> Vec<DeviceProfile> {
        self.entries
            .iter()
            .map(|(name, prefix)| DeviceProfile {
                name: name.clone(),
                prefix: prefix.clone(),
            })
            .collect()
    }

    /// Number of profiles
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no profiles
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<DeviceProfile>> for ProfileTable {
    fn from(profiles: Vec<DeviceProfile>) -> Self {
        Self::from_pairs(profiles.into_iter().map(|p| (p.name, p.prefix)))
    }
}

fn decode(prefix: &str) -> std::result::Result<[u8; 3], String> {
    let parts: Vec<&str> = prefix.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(format!(
            "prefix '{prefix}' has {} octets, expected 3",
            parts.len()
        ));
    }

    let mut oui = [0u8; 3];
    for (slot, part) in oui.iter_mut().zip(&parts) {
        if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("prefix '{prefix}' has invalid octet '{part}'"));
        }
        *slot = u8::from_str_radix(part, 16)
            .map_err(|_| format!("prefix '{prefix}' has invalid octet '{part}'"))?;
    }
    Ok(oui)
}
