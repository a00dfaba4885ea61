//! Shadow Folder CLI
//!
//! Runs shadow folders against a directory of git repositories.

mod cli;
mod commands;
mod config;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use config::Config;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose).map_err(|e| CliError::user(format!("logging: {}", e)))?;
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let config = Config::load(&cli.config)?;
    execute_command(cli.command, &config)
}

fn execute_command(cmd: Commands, config: &Config) -> Result<()> {
    match cmd {
        Commands::Sync => commands::run_sync(config),
        Commands::Watch { interval } => commands::run_watch(config, interval),
        Commands::Hook { repository } => commands::run_hook(config, &repository),
        Commands::Check => commands::run_check(config),
    }
}
