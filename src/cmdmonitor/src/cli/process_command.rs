use anyhow::{Context, Result};
use clap::Parser;

use super::commands::{Cli, Command};
use super::handlers;
use crate::config::ConfigLoader;
use crate::logging::{setup_cli_logging, setup_logging};

/// Parses the command line and runs the selected command.
pub fn process_command() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    if command == Command::Version {
        println!("cmdmonitor {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = ConfigLoader::load(cli.config.as_deref())?;
    config.validate().context("Invalid configuration")?;

    if command == Command::Run {
        setup_logging(&config.log_level, config.log_file())?;
    } else {
        setup_cli_logging()?;
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        match command {
            Command::Run => handlers::run(config).await,
            Command::Scan { json } => handlers::scan(&config, json).await,
            Command::Status { json, limit } => handlers::status(&config, json, limit),
            Command::Tag { entry } => handlers::tag(&config, &entry),
            Command::Untag { entry } => handlers::untag(&config, &entry),
            Command::TestNotify { message } => {
                handlers::test_notify(&config, message.as_deref()).await
            }
            Command::Config => {
                println!("{config}");
                Ok(())
            }
            Command::Version => Ok(()),
        }
    })
}
