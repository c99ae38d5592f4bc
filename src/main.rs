#![forbid(unsafe_code)]

mod commands;
mod config;
mod constants;
mod error;
mod firefox;
mod presets;
mod sync;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::{Level as TraceLevel, debug};
use tracing_subscriber::FmtSubscriber;

use commands::Cli;

fn init_tracing() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "warn".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "info" => TraceLevel::INFO,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::WARN,
    };

    // stdout is reserved for command output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("failed to initialize logging: {e}");
    }

    let cli = Cli::parse();

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            eprintln!("Encountered error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
