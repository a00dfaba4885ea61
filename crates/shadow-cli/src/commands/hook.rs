//! git post-receive hook entry point

use std::io::{self, Read};

use colored::Colorize;

use super::start;
use crate::config::Config;
use crate::error::Result;

/// Dispatch post-receive lines from stdin as events for `repository`.
pub fn run_hook(config: &Config, repository: &str) -> Result<()> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let running = start(config)?;
    let delivered = running.server.dispatch_post_receive(repository, &input)?;

    println!(
        "{} Delivered {} change(s) from {}",
        "=>".blue().bold(),
        delivered,
        repository.cyan()
    );
    Ok(())
}
