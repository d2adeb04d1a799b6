//! MAC address synthesis
//!
//! Two schemes:
//! - profile prefix + 3 random octets, for a known device type
//! - `02` + 5 random octets (locally administered, unicast) otherwise
//!
//! Generation never fails. When a device type was asked for but could not
//! be honoured, [`Generated::fallback`] says why.

use rand::Rng;

use crate::mac::MacAddress;
use crate::profile::{Lookup, ProfileTable};

/// First octet of every address built by the default scheme
pub const LOCAL_UNICAST_OCTET: u8 = 0x02;

/// Why the default scheme was used in place of a requested profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// The device type is not in the table
    UnknownProfile(String),
    /// The device type exists but its prefix is not 3 octets
    MalformedPrefix {
        /// Requested device type
        name: String,
        /// What was wrong with the prefix
        reason: String,
    },
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::UnknownProfile(name) => {
                write!(f, "unknown device type '{name}', using a random local address")
            }
            Fallback::MalformedPrefix { name, reason } => write!(
                f,
                "malformed prefix for device type '{name}' ({reason}), using a random local address"
            ),
        }
    }
}

/// A freshly generated address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// The address
    pub mac: MacAddress,
    /// Set when a requested profile could not be used
    pub fallback: Option<Fallback>,
}

/// Generates addresses from an injected profile table
#[derive(Debug, Clone)]
pub struct Synthesizer {
    profiles: ProfileTable,
}

impl Synthesizer {
    /// Create a synthesizer over a profile table
    #[must_use]
    pub fn new(profiles: ProfileTable) -> Self {
        Self { profiles }
    }

    /// The table this synthesizer draws prefixes from
    #[must_use]
    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    /// Generate an address using the thread-local RNG
    #[must_use]
    pub fn generate(&self, device_type: Option<&str>) -> Generated {
        self.generate_with(&mut rand::thread_rng(), device_type)
    }

    /// Generate an address drawing randomness from `rng`
    pub fn generate_with<R: Rng>(&self, rng: &mut R, device_type: Option<&str>) -> Generated {
        let fallback = match device_type {
            None => None,
            Some(name) => match self.profiles.decode_prefix(name) {
                Lookup::Found(oui) => {
                    let mac = with_prefix(rng, oui);
                    log::debug!("Generated {mac} for device type {name}");
                    return Generated { mac, fallback: None };
                }
                Lookup::Unknown => {
                    log::debug!("Device type {name} not in profile table, falling back");
                    Some(Fallback::UnknownProfile(name.to_string()))
                }
                Lookup::Malformed(reason) => {
                    log::warn!("Malformed prefix for device type '{name}': {reason}. Falling back to default.");
                    Some(Fallback::MalformedPrefix {
                        name: name.to_string(),
                        reason,
                    })
                }
            },
        };

        let mut bytes = [0u8; 6];
        bytes[0] = LOCAL_UNICAST_OCTET;
        rng.fill(&mut bytes[1..]);

        Generated {
            mac: MacAddress::new(bytes),
            fallback,
        }
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(ProfileTable::builtin())
    }
}

fn with_prefix<R: Rng>(rng: &mut R, oui: [u8; 3]) -> MacAddress {
    let mut bytes = [0u8; 6];
    bytes[..3].copy_from_slice(&oui);
    rng.fill(&mut bytes[3..]);
    MacAddress::new(bytes)
}
