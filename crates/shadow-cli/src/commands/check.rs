//! Startup resolution without side effects

use colored::Colorize;

use super::open_server;
use crate::config::Config;
use crate::error::{CliError, Result};

/// Resolve every mirror against the server and report its target.
///
/// Nothing is created and no controller is registered.
pub fn run_check(config: &Config) -> Result<()> {
    println!("{} Checking shadow folders...", "=>".blue().bold());

    let server = open_server(config)?;
    let mut failures = 0;

    for (index, mirror) in config.mirror.iter().enumerate() {
        match mirror.resolve(&server) {
            Ok((_, settings)) => {
                let state = if settings.target.is_dir() {
                    "exists".green()
                } else {
                    "will be created".yellow()
                };
                println!(
                    "   {} {} {} -> {} ({})",
                    "OK".green().bold(),
                    settings.repository.cyan(),
                    settings.stream,
                    settings.target,
                    state
                );
            }
            Err(e) => {
                failures += 1;
                println!("   {} mirror {}: {}", "ERR".red().bold(), index, e);
            }
        }
    }

    if config.mirror.is_empty() {
        return Err(CliError::user("No mirrors configured"));
    }
    if failures > 0 {
        return Err(CliError::user(format!(
            "{} of {} mirrors are misconfigured",
            failures,
            config.mirror.len()
        )));
    }

    println!("{} All mirrors resolve.", "OK".green().bold());
    Ok(())
}
