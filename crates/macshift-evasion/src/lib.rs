//! # macshift-evasion
//!
//! MAC address spoofing and restoration for a single network interface.
//!
//! ## Features
//!
//! - **MAC Synthesis**: random locally administered addresses, or addresses
//!   carrying a device-type vendor prefix
//! - **Original Address Store**: one record per interface so a spoofed
//!   interface can be put back
//! - **Spoof Controller**: check / set / restore with verification after
//!   every change
//!
//! ## Example
//!
//! ```no_run
//! use macshift_evasion::{Action, MacshiftConfig, SpoofController, Synthesizer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MacshiftConfig::default();
//!     let controller = SpoofController::new(
//!         config.system_control(),
//!         config.address_store(),
//!         Synthesizer::new(config.profile_table()),
//!     );
//!
//!     let report = controller.run("wlan0", &Action::SetProfile("phone".into()))?;
//!     println!("{report}");
//!
//!     controller.run("wlan0", &Action::Restore)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Support
//!
//! Interface changes go through `ifconfig` or `ip`, prefixed with `sudo`
//! when not running as root.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod error;
pub mod iface;
pub mod mac;
pub mod profile;
pub mod store;
pub mod synth;

pub use config::MacshiftConfig;
pub use controller::{Action, Outcome, Report, SpoofController};
pub use error::{ApplyStep, ErrorKind, Result, SpoofError};
pub use iface::{has_root_privileges, Backend, Elevation, InterfaceControl, SystemControl};
pub use mac::MacAddress;
pub use profile::{DeviceProfile, Lookup, ProfileTable};
pub use store::{AddressStore, InterfaceName};
pub use synth::{Fallback, Generated, Synthesizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
