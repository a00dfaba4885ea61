//! One-shot synchronization of every shadow folder

use colored::Colorize;

use super::{describe, failed, start};
use crate::config::Config;
use crate::error::{CliError, Result};

/// Start every mirror and deliver the idle tick that primes it.
pub fn run_sync(config: &Config) -> Result<()> {
    println!("{} Synchronizing shadow folders...", "=>".blue().bold());

    let running = start(config)?;
    let mut failures = 0;

    for controller in &running.controllers {
        let dispatch = controller.idle();
        let settings = controller.settings();
        println!(
            "   {} {} -> {}: {}",
            settings.repository.cyan(),
            settings.stream,
            settings.target,
            describe(dispatch)
        );
        if failed(dispatch) {
            failures += 1;
        }
    }

    if failures > 0 {
        return Err(CliError::user(format!(
            "{} of {} shadow folders could not be synchronized",
            failures,
            running.controllers.len()
        )));
    }

    println!("{} Shadow folders are up to date.", "OK".green().bold());
    Ok(())
}
