//! Spoof controller
//!
//! Runs one of four mutually exclusive actions against a single interface:
//!
//! - `check`: read the current address
//! - `set` (explicit or generated): query → compare → save original → apply → verify
//! - `restore`: read saved original → apply → verify → delete record
//!
//! Each run either returns a [`Report`] or a [`SpoofError`]; nothing is left
//! half-done inside the controller. The live interface can still end up
//! down if a later step of the down/set/up sequence fails, since completed
//! steps are never rolled back.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Result, SpoofError};
use crate::iface::InterfaceControl;
use crate::mac::MacAddress;
use crate::store::{AddressStore, InterfaceName};
use crate::synth::Synthesizer;

/// The single action requested for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Report the current address
    Check,
    /// Set a caller-supplied address literal
    SetExplicit(String),
    /// Set an address generated for a device type
    SetProfile(String),
    /// Put back the saved original address
    Restore,
}

impl Action {
    /// Whether this action changes the interface
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Action::Check)
    }

    /// Short name used in reports
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Action::Check => "check",
            Action::SetExplicit(_) => "set",
            Action::SetProfile(_) => "set_device",
            Action::Restore => "restore",
        }
    }
}

/// Terminal result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// `check` read the address
    Current {
        /// Address currently on the interface
        mac: MacAddress,
    },
    /// `set` found the target already in place; nothing was saved or applied
    Unchanged {
        /// Address currently on the interface
        mac: MacAddress,
    },
    /// `set` applied and verified a new address
    Spoofed {
        /// Address before the change, if it could be read
        original: Option<MacAddress>,
        /// Address now on the interface
        current: MacAddress,
        /// Where the original was saved
        record: Option<PathBuf>,
    },
    /// `restore` applied and verified the saved original
    Restored {
        /// Address now on the interface
        mac: MacAddress,
        /// Whether the saved record was removed
        record_removed: bool,
    },
    /// `restore` found no saved original
    NothingToRestore,
}

/// Outcome of one run plus any non-fatal warnings raised along the way
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Interface acted on
    pub interface: InterfaceName,
    /// Action name
    pub action: &'static str,
    /// What happened
    pub outcome: Outcome,
    /// Non-fatal problems, in the order they occurred
    pub warnings: Vec<String>,
}

impl Report {
    fn new(interface: &InterfaceName, action: &Action, outcome: Outcome, warnings: Vec<String>) -> Self {
        Self {
            interface: interface.clone(),
            action: action.name(),
            outcome,
            warnings,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let iface = &self.interface;
        match &self.outcome {
            Outcome::Current { mac } => write!(f, "Current MAC for {iface}: {mac}"),
            Outcome::Unchanged { mac } => write!(
                f,
                "The new MAC address {mac} is the same as the current MAC of {iface}. No change needed."
            ),
            Outcome::Spoofed {
                original, current, ..
            } => match original {
                Some(original) => write!(
                    f,
                    "SUCCESS: MAC address for {iface} is now {current} (original {original} saved)"
                ),
                None => write!(
                    f,
                    "SUCCESS: MAC address for {iface} is now {current} (original not saved)"
                ),
            },
            Outcome::Restored { mac, .. } => write!(
                f,
                "Original MAC address {mac} successfully restored for {iface}."
            ),
            Outcome::NothingToRestore => write!(
                f,
                "No original MAC address found saved for {iface}. Cannot restore."
            ),
        }
    }
}

/// Orchestrates check, set and restore over an [`InterfaceControl`]
pub struct SpoofController<C> {
    control: C,
    store: AddressStore,
    synth: Synthesizer,
}

impl<C: InterfaceControl> SpoofController<C> {
    /// Create a controller from its three collaborators
    pub fn new(control: C, store: AddressStore, synth: Synthesizer) -> Self {
        Self {
            control,
            store,
            synth,
        }
    }

    /// The interface collaborator
    pub fn control(&self) -> &C {
        &self.control
    }

    /// The original-address store
    pub fn store(&self) -> &AddressStore {
        &self.store
    }

    /// The address synthesizer
    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synth
    }

    /// Run `action` against `interface`
    ///
    /// The interface name, and for [`Action::SetExplicit`] the address
    /// literal, are validated before the collaborator is touched.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`SpoofError`] hit by the action
    pub fn run(&self, interface: &str, action: &Action) -> Result<Report> {
        let iface = InterfaceName::parse(interface)?;

        match action {
            Action::Check => self.check(&iface, action),
            Action::SetExplicit(literal) => {
                let target = MacAddress::parse(literal)?;
                log::info!("Preparing to spoof MAC for {iface} to {target}");
                self.set(&iface, action, target, Vec::new())
            }
            Action::SetProfile(device_type) => {
                log::info!("Preparing to spoof MAC for {iface} using device type {device_type}");
                let generated = self.synth.generate(Some(device_type));
                log::info!("Generated MAC for {device_type}: {}", generated.mac);
                let warnings = generated
                    .fallback
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                self.set(&iface, action, generated.mac, warnings)
            }
            Action::Restore => self.restore(&iface, action),
        }
    }

    fn check(&self, iface: &InterfaceName, action: &Action) -> Result<Report> {
        log::info!("Checking current MAC address for {iface}");
        let mac = self.control.query_mac(iface.as_str())?;
        Ok(Report::new(iface, action, Outcome::Current { mac }, Vec::new()))
    }

    fn set(
        &self,
        iface: &InterfaceName,
        action: &Action,
        target: MacAddress,
        mut warnings: Vec<String>,
    ) -> Result<Report> {
        let original = match self.control.query_mac(iface.as_str()) {
            Ok(mac) => Some(mac),
            Err(e) => {
                log::warn!("{e}");
                warnings.push(format!(
                    "Could not retrieve current MAC for {iface}; original not saved. Proceeding with caution to change MAC to {target}"
                ));
                None
            }
        };

        let record = match original {
            Some(current) if current == target => {
                log::info!("{iface} already has {target}, no change needed");
                return Ok(Report::new(
                    iface,
                    action,
                    Outcome::Unchanged { mac: current },
                    warnings,
                ));
            }
            Some(current) => {
                log::info!("Current (original) MAC for {iface}: {current}");
                Some(self.store.save(iface, &current).map_err(|e| {
                    log::error!("Halting spoofing process for {iface} due to failure saving original MAC");
                    e
                })?)
            }
            None => None,
        };

        self.apply(iface, &target)?;
        self.verify(iface, &target)?;

        Ok(Report::new(
            iface,
            action,
            Outcome::Spoofed {
                original,
                current: target,
                record,
            },
            warnings,
        ))
    }

    fn restore(&self, iface: &InterfaceName, action: &Action) -> Result<Report> {
        log::info!("Attempting to restore original MAC for {iface}");
        let Some(original) = self.store.read(iface) else {
            return Ok(Report::new(iface, action, Outcome::NothingToRestore, Vec::new()));
        };

        self.apply(iface, &original)?;
        self.verify(iface, &original)?;

        let mut warnings = Vec::new();
        let record_removed = match self.store.delete(iface) {
            Ok(removed) => removed,
            Err(e) => {
                warnings.push(format!("Restored, but {e}"));
                false
            }
        };

        Ok(Report::new(
            iface,
            action,
            Outcome::Restored {
                mac: original,
                record_removed,
            },
            warnings,
        ))
    }

    fn apply(&self, iface: &InterfaceName, mac: &MacAddress) -> Result<()> {
        let name = iface.as_str();
        log::info!("Disabling {iface}");
        self.control.set_down(name)?;
        log::info!("Changing MAC address for {iface} to {mac}");
        self.control.set_hardware_address(name, mac)?;
        log::info!("Enabling {iface}");
        self.control.set_up(name)?;
        Ok(())
    }

    fn verify(&self, iface: &InterfaceName, expected: &MacAddress) -> Result<()> {
        log::info!("Verifying MAC change for {iface}");
        let actual = match self.control.query_mac(iface.as_str()) {
            Ok(mac) => Some(mac),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        };

        if actual.as_ref() == Some(expected) {
            return Ok(());
        }

        Err(SpoofError::VerifyMismatch {
            interface: iface.to_string(),
            expected: *expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str) -> InterfaceName {
        InterfaceName::parse(name).unwrap()
    }

    #[test]
    fn test_action_flags() {
        assert!(!Action::Check.is_mutating());
        assert!(Action::Restore.is_mutating());
        assert!(Action::SetExplicit("AA:BB:CC:DD:EE:FF".into()).is_mutating());
        assert_eq!(Action::SetProfile("phone".into()).name(), "set_device");
    }

    #[test]
    fn test_report_messages() {
        let mac: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        let report = Report::new(&iface("eth0"), &Action::Check, Outcome::Current { mac }, Vec::new());
        assert_eq!(report.to_string(), "Current MAC for eth0: 00:11:22:33:44:55");

        let report = Report::new(&iface("eth0"), &Action::Restore, Outcome::NothingToRestore, Vec::new());
        assert!(report
            .to_string()
            .contains("No original MAC address found saved for eth0"));
    }

    #[test]
    fn test_report_serializes_with_tag() {
        let mac: MacAddress = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let report = Report::new(
            &iface("wlan0"),
            &Action::SetExplicit(mac.to_string()),
            Outcome::Spoofed {
                original: None,
                current: mac,
                record: None,
            },
            vec!["careful".into()],
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["interface"], "wlan0");
        assert_eq!(value["action"], "set");
        assert_eq!(value["outcome"]["result"], "spoofed");
        assert_eq!(value["outcome"]["current"], "AA:BB:CC:DD:EE:FF");
        assert_eq!(value["warnings"][0], "careful");
    }
}
