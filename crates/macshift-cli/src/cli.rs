use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use macshift_evasion::{Action, Backend};

#[derive(Parser, Debug)]
#[command(
    name = "macshift",
    author,
    version,
    about = "Spoof, check and restore the MAC address of a network interface",
    group(
        ArgGroup::new("action")
            .required(true)
            .args(["new_mac", "device_type", "restore", "check", "write_config"])
    )
)]
pub struct Cli {
    /// Network interface to act on (e.g. eth0, wlan0)
    #[arg(required_unless_present = "write_config")]
    pub interface: Option<String>,

    /// Set this MAC address (XX:XX:XX:XX:XX:XX or XX-XX-XX-XX-XX-XX)
    #[arg(short = 'm', long = "new-mac", alias = "new_mac", value_name = "MAC")]
    pub new_mac: Option<String>,

    /// Generate an address for a device type from the profile table
    /// (an unknown type lists the available ones)
    #[arg(short = 'd', long = "device-type", alias = "device_type", value_name = "TYPE")]
    pub device_type: Option<String>,

    /// Restore the saved original MAC address
    #[arg(short, long)]
    pub restore: bool,

    /// Show the current MAC address
    #[arg(short, long)]
    pub check: bool,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for saved original addresses (overrides the config file)
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Tool used to query and change the interface (overrides the config file)
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Never prefix interface changes with sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Write the effective configuration (file plus overrides) to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_config: Option<PathBuf>,

    /// Output format for results
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What one invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Act on an interface
    Run { interface: String, action: Action },
    /// Save the effective configuration
    WriteConfig(PathBuf),
}

impl Cli {
    /// The single request selected by the mutually exclusive flags
    pub fn request(&self) -> Request {
        if let Some(path) = &self.write_config {
            return Request::WriteConfig(path.clone());
        }

        let action = if let Some(mac) = &self.new_mac {
            Action::SetExplicit(mac.clone())
        } else if let Some(device_type) = &self.device_type {
            Action::SetProfile(device_type.clone())
        } else if self.restore {
            Action::Restore
        } else {
            Action::Check
        };

        // clap requires the interface for every other request; an empty
        // name is rejected by interface validation
        Request::Run {
            interface: self.interface.clone().unwrap_or_default(),
            action,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Ifconfig,
    Ip,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Ifconfig => Backend::Ifconfig,
            BackendArg::Ip => Backend::Ip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("macshift").chain(args.iter().copied()))
    }

    fn run(interface: &str, action: Action) -> Request {
        Request::Run {
            interface: interface.into(),
            action,
        }
    }

    #[test]
    fn test_each_action_parses() {
        let cli = parse(&["eth0", "-m", "AA:BB:CC:DD:EE:FF"]).unwrap();
        assert_eq!(
            cli.request(),
            run("eth0", Action::SetExplicit("AA:BB:CC:DD:EE:FF".into()))
        );

        let cli = parse(&["wlan0", "--device-type", "phone"]).unwrap();
        assert_eq!(cli.request(), run("wlan0", Action::SetProfile("phone".into())));

        assert_eq!(parse(&["eth0", "-r"]).unwrap().request(), run("eth0", Action::Restore));
        assert_eq!(parse(&["eth0", "--check"]).unwrap().request(), run("eth0", Action::Check));
    }

    #[test]
    fn test_underscore_flag_spellings() {
        let cli = parse(&["eth0", "--new_mac", "AA:BB:CC:DD:EE:FF"]).unwrap();
        assert_eq!(
            cli.request(),
            run("eth0", Action::SetExplicit("AA:BB:CC:DD:EE:FF".into()))
        );

        let cli = parse(&["eth0", "--device_type", "earbuds"]).unwrap();
        assert_eq!(cli.request(), run("eth0", Action::SetProfile("earbuds".into())));
    }

    #[test]
    fn test_write_config_needs_no_interface() {
        let cli = parse(&["--write-config", "/tmp/macshift.json", "--backend", "ip"]).unwrap();
        assert_eq!(
            cli.request(),
            Request::WriteConfig(PathBuf::from("/tmp/macshift.json"))
        );

        let err = parse(&["eth0", "-c", "--write-config", "/tmp/macshift.json"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_device_type_help_does_not_list_builtin_types() {
        let cmd = Cli::command();
        let arg = cmd
            .get_arguments()
            .find(|arg| arg.get_id() == "device_type")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert!(help.contains("profile table"));
        assert!(!help.contains("smartwatch"));
    }

    #[test]
    fn test_action_is_required() {
        let err = parse(&["eth0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_actions_are_mutually_exclusive() {
        let err = parse(&["eth0", "-c", "-r"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let err = parse(&["eth0", "-m", "AA:BB:CC:DD:EE:FF", "-d", "phone"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_interface_is_required() {
        let err = parse(&["-c"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_output_and_overrides() {
        let cli = parse(&[
            "eth0",
            "-c",
            "--output",
            "json",
            "--backend",
            "ip",
            "--no-sudo",
            "--state-dir",
            "/tmp/macshift",
        ])
        .unwrap();
        assert_eq!(cli.output_format, OutputFormat::Json);
        assert_eq!(cli.backend.map(Backend::from), Some(Backend::Ip));
        assert!(cli.no_sudo);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/macshift")));

        let cli = parse(&["eth0", "-c"]).unwrap();
        assert_eq!(cli.output_format, OutputFormat::Text);
        assert_eq!(cli.backend, None);
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["eth0", "-c"]).unwrap().log_filter(), "warn");
        assert_eq!(parse(&["eth0", "-c", "-v"]).unwrap().log_filter(), "info");
        assert_eq!(parse(&["eth0", "-c", "-vvv"]).unwrap().log_filter(), "debug");
    }

    #[test]
    fn test_bad_output_format_rejected() {
        let err = parse(&["eth0", "-c", "--output", "xml"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
