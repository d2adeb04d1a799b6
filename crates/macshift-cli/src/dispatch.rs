use std::path::Path;

use anyhow::{bail, Context, Result};
use macshift_evasion::{
    has_root_privileges, Action, Elevation, ErrorKind, MacshiftConfig, ProfileTable,
    SpoofController, SpoofError, Synthesizer,
};
use serde_json::Value;

use crate::cli::{Cli, Request};

/// Load the config file, if any, and apply command line overrides
pub fn resolve_config(cli: &Cli) -> Result<MacshiftConfig> {
    let mut config = match &cli.config {
        Some(path) => MacshiftConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => MacshiftConfig::default(),
    };

    if let Some(dir) = &cli.state_dir {
        config.state_dir = dir.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if cli.no_sudo {
        config.elevation = Elevation::Never;
    }

    log::debug!("Using configuration: {config:?}");
    Ok(config)
}

/// Reject device types missing from the loaded table
pub fn ensure_known_device_type(profiles: &ProfileTable, action: &Action) -> Result<()> {
    if let Action::SetProfile(name) = action {
        if !profiles.contains(name) {
            bail!(
                "Unknown device type '{name}'. Available types: {}",
                profiles.names().join(", ")
            );
        }
    }
    Ok(())
}

pub fn dispatch_command(cli: &Cli, config: &MacshiftConfig) -> Result<(String, Value)> {
    match cli.request() {
        Request::WriteConfig(path) => write_config(config, &path),
        Request::Run { interface, action } => run_action(config, &interface, &action),
    }
}

fn write_config(config: &MacshiftConfig, path: &Path) -> Result<(String, Value)> {
    config
        .save(path)
        .with_context(|| format!("writing configuration to {}", path.display()))?;
    let data = serde_json::to_value(config).context("serializing configuration")?;
    Ok((format!("Configuration written to {}", path.display()), data))
}

fn run_action(config: &MacshiftConfig, interface: &str, action: &Action) -> Result<(String, Value)> {
    let profiles = config.profile_table();
    ensure_known_device_type(&profiles, action)?;

    if action.is_mutating() && !has_root_privileges() {
        log::warn!(
            "Not running as root. Changing or restoring a MAC address usually requires root privileges"
        );
    }

    let controller = SpoofController::new(
        config.system_control(),
        config.address_store(),
        Synthesizer::new(profiles),
    );

    let report = controller
        .run(interface, action)
        .with_context(|| format!("{} failed for interface '{interface}'", action.name()))?;

    for warning in &report.warnings {
        log::warn!("{warning}");
    }

    let data = serde_json::to_value(&report).context("serializing report")?;
    Ok((report.to_string(), data))
}

/// Class of the library error behind `err`, if it came from the library
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<SpoofError>().map(SpoofError::kind)
}

/// Extra guidance for errors the user can fix by changing the arguments
pub fn usage_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<SpoofError>()
        .filter(|e| e.is_validation())
        .map(|_| {
            "Interface names may contain letters, digits, '_' and '-'; \
             MAC addresses are six hex pairs like AA:BB:CC:DD:EE:FF. See --help."
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use macshift_evasion::Backend;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("macshift").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = resolve_config(&cli(&["eth0", "-c"])).unwrap();
        assert_eq!(config, MacshiftConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macshift.json");
        std::fs::write(&path, r#"{ "state_dir": "/var/lib/macshift", "elevation": "sudo" }"#)
            .unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = resolve_config(&cli(&["eth0", "-c", "--config", &path_arg])).unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/macshift"));
        assert_eq!(config.elevation, Elevation::Sudo);

        let config = resolve_config(&cli(&[
            "eth0",
            "-c",
            "--config",
            &path_arg,
            "--state-dir",
            "/tmp/state",
            "--backend",
            "ip",
            "--no-sudo",
        ]))
        .unwrap();
        assert_eq!(config.state_dir, PathBuf::from("/tmp/state"));
        assert_eq!(config.backend, Backend::Ip);
        assert_eq!(config.elevation, Elevation::Never);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = resolve_config(&cli(&["eth0", "-c", "--config", "/nonexistent/macshift.json"]))
            .unwrap_err();
        assert!(err.to_string().contains("loading configuration"));
        assert!(err.downcast_ref::<SpoofError>().is_some());
    }

    #[test]
    fn test_unknown_device_type_rejected() {
        let table = ProfileTable::builtin();
        let err = ensure_known_device_type(&table, &Action::SetProfile("toaster".into()))
            .unwrap_err()
            .to_string();
        assert!(err.contains("toaster"));
        assert!(err.contains("desktop, earbuds, phone, smartwatch"));

        ensure_known_device_type(&table, &Action::SetProfile("PHONE".into())).unwrap();
        ensure_known_device_type(&table, &Action::Restore).unwrap();
    }

    #[test]
    fn test_invalid_interface_fails_before_system_calls() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().to_string_lossy().into_owned();
        let cli = cli(&["eth0;reboot", "-m", "AA:BB:CC:DD:EE:FF", "--state-dir", &state]);
        let config = resolve_config(&cli).unwrap();

        let err = dispatch_command(&cli, &config).unwrap_err();
        let cause = err.downcast_ref::<SpoofError>().unwrap();
        assert!(matches!(cause, SpoofError::InvalidInterface(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_mac_fails_before_system_calls() {
        let cli = cli(&["eth0", "-m", "AA:BB:CC:DD:EE"]);
        let config = resolve_config(&cli).unwrap();

        let err = dispatch_command(&cli, &config).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Validation));
        assert!(usage_hint(&err).unwrap().contains("AA:BB:CC:DD:EE:FF"));
    }

    #[test]
    fn test_non_validation_errors_have_no_hint() {
        let err = resolve_config(&cli(&["eth0", "-c", "--config", "/nonexistent/macshift.json"]))
            .unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Config));
        assert_eq!(usage_hint(&err), None);

        let table = ProfileTable::builtin();
        let err = ensure_known_device_type(&table, &Action::SetProfile("toaster".into()))
            .unwrap_err();
        assert_eq!(error_kind(&err), None);
        assert_eq!(usage_hint(&err), None);
    }

    #[test]
    fn test_write_config_saves_effective_configuration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("macshift.json");
        let path_arg = path.to_string_lossy().into_owned();
        let cli = cli(&["--write-config", &path_arg, "--backend", "ip", "--no-sudo"]);
        let config = resolve_config(&cli).unwrap();

        let (message, data) = dispatch_command(&cli, &config).unwrap();

        assert!(message.starts_with("Configuration written to"));
        assert_eq!(data["backend"], "ip");
        let saved = MacshiftConfig::load(&path).unwrap();
        assert_eq!(saved.backend, Backend::Ip);
        assert_eq!(saved.elevation, Elevation::Never);
        assert_eq!(saved.profile_table(), ProfileTable::builtin());
    }
}
