//! Interface control
//!
//! [`InterfaceControl`] is the only way the controller touches a live
//! interface. [`SystemControl`] implements it by running the OS network
//! tools (`ifconfig` or `ip`), wrapping mutating commands in `sudo` when
//! the [`Elevation`] policy asks for it.

use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ApplyStep, Result, SpoofError};
use crate::mac::MacAddress;

/// Read and write access to an interface's hardware address
pub trait InterfaceControl {
    /// Current hardware address of `interface`
    fn query_mac(&self, interface: &str) -> Result<MacAddress>;
    /// Administratively disable `interface`
    fn set_down(&self, interface: &str) -> Result<()>;
    /// Write a new hardware address to `interface`
    fn set_hardware_address(&self, interface: &str, mac: &MacAddress) -> Result<()>;
    /// Administratively enable `interface`
    fn set_up(&self, interface: &str) -> Result<()>;
}

/// Which OS tool to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// net-tools `ifconfig`
    #[default]
    Ifconfig,
    /// iproute2 `ip link`
    Ip,
}

/// When to prefix mutating commands with `sudo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Elevation {
    /// Use sudo unless already running as root
    #[default]
    Auto,
    /// Always use sudo
    Sudo,
    /// Never use sudo
    Never,
}

impl Elevation {
    fn wants_sudo(self) -> bool {
        match self {
            Elevation::Auto => !has_root_privileges(),
            Elevation::Sudo => true,
            Elevation::Never => false,
        }
    }
}

/// Check if running with an effective uid of 0
#[cfg(unix)]
#[must_use]
pub fn has_root_privileges() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Check if running with an effective uid of 0
#[cfg(not(unix))]
#[must_use]
pub fn has_root_privileges() -> bool {
    false
}

/// A fully resolved command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
}

impl CommandLine {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    fn elevated(self) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: "sudo".to_string(),
            args,
        }
    }

    fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// [`InterfaceControl`] backed by OS command-line tools
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemControl {
    backend: Backend,
    elevation: Elevation,
}

impl SystemControl {
    /// Create a controller for the given tool and privilege policy
    #[must_use]
    pub fn new(backend: Backend, elevation: Elevation) -> Self {
        Self { backend, elevation }
    }

    /// Command used to read the current address
    #[must_use]
    pub fn query_command(&self, interface: &str) -> CommandLine {
        match self.backend {
            Backend::Ifconfig => CommandLine::new("ifconfig", &[interface]),
            Backend::Ip => CommandLine::new("ip", &["link", "show", "dev", interface]),
        }
    }

    /// Command used for one step of the apply sequence
    #[must_use]
    pub fn apply_command(&self, interface: &str, step: ApplyStep, mac: Option<&MacAddress>) -> CommandLine {
        let mac_text = mac.map(ToString::to_string).unwrap_or_default();
        let cmd = match (self.backend, step) {
            (Backend::Ifconfig, ApplyStep::Down) => CommandLine::new("ifconfig", &[interface, "down"]),
            (Backend::Ifconfig, ApplyStep::SetAddress) => {
                CommandLine::new("ifconfig", &[interface, "hw", "ether", mac_text.as_str()])
            }
            (Backend::Ifconfig, ApplyStep::Up) => CommandLine::new("ifconfig", &[interface, "up"]),
            (Backend::Ip, ApplyStep::Down) => {
                CommandLine::new("ip", &["link", "set", "dev", interface, "down"])
            }
            (Backend::Ip, ApplyStep::SetAddress) => {
                CommandLine::new("ip", &["link", "set", "dev", interface, "address", mac_text.as_str()])
            }
            (Backend::Ip, ApplyStep::Up) => CommandLine::new("ip", &["link", "set", "dev", interface, "up"]),
        };

        if self.elevation.wants_sudo() {
            cmd.elevated()
        } else {
            cmd
        }
    }

    fn apply(&self, interface: &str, step: ApplyStep, mac: Option<&MacAddress>) -> Result<()> {
        let cmd = self.apply_command(interface, step, mac);
        log::debug!("Executing: {}", cmd.display());

        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .output()
            .map_err(|e| {
                SpoofError::apply(
                    interface,
                    step,
                    format!("could not run '{}': {e}. Ensure it is installed and in your PATH", cmd.program),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!("Command '{}' failed: {}", cmd.display(), stderr.trim());
            return Err(SpoofError::apply(
                interface,
                step,
                format!(
                    "command '{}' returned {}: {}",
                    cmd.display(),
                    output.status,
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}

impl InterfaceControl for SystemControl {
    fn query_mac(&self, interface: &str) -> Result<MacAddress> {
        let cmd = self.query_command(interface);
        log::debug!("Executing: {}", cmd.display());

        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .output()
            .map_err(|e| {
                SpoofError::query(
                    interface,
                    format!("could not run '{}': {e}. Ensure it is installed and in your PATH", cmd.program),
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpoofError::query(
                interface,
                format!("command '{}' failed: {}", cmd.display(), stderr.trim()),
            ));
        }

        let found = match self.backend {
            Backend::Ifconfig => parse_ifconfig_mac(&stdout),
            Backend::Ip => parse_ip_link_mac(&stdout),
        };

        found.ok_or_else(|| {
            SpoofError::query(
                interface,
                "no MAC address in command output; check the interface has a hardware address",
            )
        })
    }

    fn set_down(&self, interface: &str) -> Result<()> {
        self.apply(interface, ApplyStep::Down, None)
    }

    fn set_hardware_address(&self, interface: &str, mac: &MacAddress) -> Result<()> {
        self.apply(interface, ApplyStep::SetAddress, Some(mac))
    }

    fn set_up(&self, interface: &str) -> Result<()> {
        self.apply(interface, ApplyStep::Up, None)
    }
}

fn ifconfig_hw_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:ether|HWaddr)\s+([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5})\b")
            .expect("static ifconfig regex")
    })
}

fn ip_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"link/\w+\s+([0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5})\b").expect("static link regex")
    })
}

/// Address following `ether` (net-tools 2.x) or `HWaddr` (legacy) in
/// `ifconfig` output
///
/// Only the hardware address line is considered, so an `inet6` address that
/// happens to contain six colon-separated pairs is never mistaken for it.
#[must_use]
pub fn parse_ifconfig_mac(output: &str) -> Option<MacAddress> {
    ifconfig_hw_regex()
        .captures_iter(output)
        .find_map(|caps| caps[1].parse().ok())
}

/// Address following `link/<type>` in `ip link show` output
#[must_use]
pub fn parse_ip_link_mac(output: &str) -> Option<MacAddress> {
    ip_link_regex()
        .captures(output)
        .and_then(|caps| caps[1].parse().ok())
}
