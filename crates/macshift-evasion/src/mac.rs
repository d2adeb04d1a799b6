//! MAC address value type
//!
//! Parsing accepts colon- or dash-separated octets in any case; display is
//! always the canonical uppercase `XX:XX:XX:XX:XX:XX` form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SpoofError};

/// A validated MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress {
    bytes: [u8; 6],
}

impl MacAddress {
    /// Create a new MAC address from bytes
    #[must_use]
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Parse a MAC address from string
    ///
    /// Accepts `AA:BB:CC:DD:EE:FF` and `AA-BB-CC-DD-EE-FF`, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`SpoofError::InvalidMac`] if the string is not six hex octets
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Get the raw bytes
    #[must_use]
    pub fn octets(&self) -> [u8; 6] {
        self.bytes
    }

    /// Locally administered addresses have bit 1 of the first byte set
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.bytes[0] & 0x02 != 0
    }

    /// Unicast addresses have bit 0 of the first byte clear
    #[must_use]
    pub fn is_unicast(&self) -> bool {
        self.bytes[0] & 0x01 == 0
    }

    /// Vendor portion (first 3 bytes)
    #[must_use]
    pub fn oui(&self) -> [u8; 3] {
        [self.bytes[0], self.bytes[1], self.bytes[2]]
    }

    /// Device-specific portion (last 3 bytes)
    #[must_use]
    pub fn nic(&self) -> [u8; 3] {
        [self.bytes[3], self.bytes[4], self.bytes[5]]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = SpoofError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let separator = if trimmed.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = trimmed.split(separator).collect();
        if parts.len() != 6 {
            return Err(SpoofError::InvalidMac(format!(
                "{trimmed} (expected 6 octets, got {})",
                parts.len()
            )));
        }

        let mut bytes = [0u8; 6];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(SpoofError::InvalidMac(format!(
                    "{trimmed} (invalid hex octet '{part}')"
                )));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| SpoofError::InvalidMac(format!("{trimmed} (invalid hex octet '{part}')")))?;
        }

        Ok(Self { bytes })
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_parse_colon() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn test_mac_parse_dash() {
        let mac: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(mac.octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    }

    #[test]
    fn test_mac_parse_is_case_insensitive() {
        let upper: MacAddress = "0A:1B:2C:3D:4E:5F".parse().unwrap();
        let lower: MacAddress = "0a:1b:2c:3d:4e:5f".parse().unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_mac_display_is_canonical() {
        let mac: MacAddress = " 0a-1b-2c-3d-4e-5f\n".parse().unwrap();
        assert_eq!(mac.to_string(), "0A:1B:2C:3D:4E:5F");
        assert_eq!(mac.to_string().len(), 17);
    }

    #[test]
    fn test_invalid_mac() {
        for bad in [
            "not a mac",
            "AA:BB",
            "AA:BB:CC:DD:EE:GG",
            "AABBCCDDEEFF",
            "AA:BB:CC:DD:EE:FF:00",
            "A:BB:CC:DD:EE:FF",
            "AA:BB-CC:DD:EE:FF",
            "+A:BB:CC:DD:EE:FF",
            "",
        ] {
            assert!(bad.parse::<MacAddress>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_mac_bits() {
        let mac = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert!(mac.is_local());
        assert!(mac.is_unicast());
        assert_eq!(mac.oui(), [0x02, 0x00, 0x00]);
        assert_eq!(mac.nic(), [0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let mac = MacAddress::new([0x8C, 0x2D, 0xAA, 0x01, 0x02, 0x03]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"8C:2D:AA:01:02:03\"");
        let back: MacAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
