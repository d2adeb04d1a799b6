//! Error types for the spoofing library
//!
//! Every failure an operation can hit maps to one [`SpoofError`] variant,
//! and every variant maps to one [`ErrorKind`] tag so callers can branch
//! without inspecting message text.

use serde::Serialize;
use thiserror::Error;

use crate::mac::MacAddress;

/// Result type alias using [`SpoofError`]
pub type Result<T> = std::result::Result<T, SpoofError>;

/// Stage of the down/set/up sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStep {
    /// Bringing the interface down
    Down,
    /// Writing the new hardware address
    SetAddress,
    /// Bringing the interface back up
    Up,
}

impl ApplyStep {
    /// Short human-readable label
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyStep::Down => "bring interface down",
            ApplyStep::SetAddress => "set hardware address",
            ApplyStep::Up => "bring interface up",
        }
    }
}

impl std::fmt::Display for ApplyStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during spoof, check and restore operations
#[derive(Error, Debug)]
pub enum SpoofError {
    /// Interface name does not match `[A-Za-z0-9_-]+`
    #[error("Invalid interface name format '{0}'")]
    InvalidInterface(String),

    /// MAC address literal is not six hex octets
    #[error("Invalid MAC address: {0}. Use XX:XX:XX:XX:XX:XX or XX-XX-XX-XX-XX-XX")]
    InvalidMac(String),

    /// The current address of the interface could not be read
    #[error("Failed to read MAC address of {interface}: {reason}")]
    Query {
        /// Interface that was queried
        interface: String,
        /// Underlying cause
        reason: String,
    },

    /// The original-address record could not be written or read
    #[error("Original MAC record error: {0}")]
    Persistence(String),

    /// One step of the down/set/up sequence failed
    #[error("Failed to {step} on {interface}: {reason}")]
    Apply {
        /// Interface being changed
        interface: String,
        /// Step that failed; later steps were not attempted
        step: ApplyStep,
        /// Underlying cause
        reason: String,
    },

    /// The address read back after applying does not match the target
    #[error("MAC address of {interface} is {} after change, expected {expected}", .actual.as_ref().map_or_else(|| "unreadable".to_string(), ToString::to_string))]
    VerifyMismatch {
        /// Interface being verified
        interface: String,
        /// Address that was applied
        expected: MacAddress,
        /// Address read back, if it could be read at all
        actual: Option<MacAddress>,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Tag identifying the class of a [`SpoofError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad interface name or MAC syntax, rejected before any mutation
    Validation,
    /// Current address could not be read
    Query,
    /// Record save/read/delete failed
    Persistence,
    /// Down/set/up sequence failed partway
    Apply,
    /// Post-apply address does not match
    VerifyMismatch,
    /// Configuration problem
    Config,
}

impl SpoofError {
    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpoofError::InvalidInterface(_) | SpoofError::InvalidMac(_) => ErrorKind::Validation,
            SpoofError::Query { .. } => ErrorKind::Query,
            SpoofError::Persistence(_) => ErrorKind::Persistence,
            SpoofError::Apply { .. } => ErrorKind::Apply,
            SpoofError::VerifyMismatch { .. } => ErrorKind::VerifyMismatch,
            SpoofError::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if this error was raised before anything was touched
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Create a query error
    #[must_use]
    pub fn query(interface: impl Into<String>, reason: impl Into<String>) -> Self {
        SpoofError::Query {
            interface: interface.into(),
            reason: reason.into(),
        }
    }

    /// Create an apply error for a given step
    #[must_use]
    pub fn apply(interface: impl Into<String>, step: ApplyStep, reason: impl Into<String>) -> Self {
        SpoofError::Apply {
            interface: interface.into(),
            step,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpoofError::InvalidInterface("eth0/../x".into());
        assert!(err.to_string().contains("eth0/../x"));
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(SpoofError::InvalidMac("zz".into()).kind(), ErrorKind::Validation);
        assert_eq!(SpoofError::query("eth0", "gone").kind(), ErrorKind::Query);
        assert_eq!(
            SpoofError::apply("eth0", ApplyStep::Up, "boom").kind(),
            ErrorKind::Apply
        );
        assert!(!SpoofError::Persistence("disk full".into()).is_validation());
    }

    #[test]
    fn test_verify_mismatch_display() {
        let expected: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let err = SpoofError::VerifyMismatch {
            interface: "eth0".into(),
            expected,
            actual: None,
        };
        let text = err.to_string();
        assert!(text.contains("unreadable"));
        assert!(text.contains("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn test_apply_display_names_step() {
        let err = SpoofError::apply("wlan0", ApplyStep::SetAddress, "exit status 1");
        assert_eq!(
            err.to_string(),
            "Failed to set hardware address on wlan0: exit status 1"
        );
    }
}
