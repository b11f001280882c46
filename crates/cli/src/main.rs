//! Stockroom CLI - inventory management API client

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(about = "Command-line client for the Stockroom inventory API")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Data directory for session credentials, configuration and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (defaults to DATA_DIR/config.toml when present)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "60")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(stockroom_core::config::default_data_dir);

    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;

    debug!("Starting Stockroom CLI");

    let settings = commands::Settings {
        data_dir,
        data_dir_overridden: cli.data_dir.is_some(),
        config: cli.config,
    };

    // Execute command with optional timeout
    if cli.timeout == 0 {
        if let Err(e) = cli.command.execute(&settings).await {
            error!("Command failed: {e}");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(&settings)).await {
            Ok(Ok(())) => {
                debug!("Command completed successfully");
            }
            Ok(Err(e)) => {
                error!("Command failed: {e}");
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                eprintln!("Error: command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
