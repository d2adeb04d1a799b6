mod cli;
mod dispatch;

use anyhow::Result;
use clap::Parser;
use serde_json::{json, Value};

use crate::cli::{Cli, OutputFormat};
use crate::dispatch::{dispatch_command, error_kind, resolve_config, usage_hint};

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    let format = cli.output_format;
    if let Err(err) = run(&cli) {
        emit_error(format, &err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let (message, data) = dispatch_command(cli, &config)?;
    emit_payload(cli.output_format, "ok", &message, data);
    Ok(())
}

fn emit_error(format: OutputFormat, err: &anyhow::Error) {
    let details: Vec<String> = err.chain().map(ToString::to_string).collect();

    match format {
        OutputFormat::Json => {
            let payload = json!({
                "status": "error",
                "message": err.to_string(),
                "kind": error_kind(err),
                "details": details,
                "data": Value::Null,
            });
            println!("{payload}");
        }
        OutputFormat::Text => {
            eprintln!("Error: {err}");
            for detail in details.iter().skip(1) {
                eprintln!("  -> {detail}");
            }
            if let Some(hint) = usage_hint(err) {
                eprintln!("{hint}");
            }
        }
    }
}

fn emit_payload(format: OutputFormat, status: &str, message: &str, data: Value) {
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "status": status,
                "message": message,
                "data": data,
            });
            println!("{payload}");
        }
        OutputFormat::Text => println!("{message}"),
    }
}
