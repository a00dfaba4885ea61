//! Long-running poll loop

use std::thread;
use std::time::Duration;

use colored::Colorize;

use super::start;
use crate::config::Config;
use crate::error::Result;

/// Start every mirror and poll the served repositories forever.
///
/// The first poll only records branch tips, so it reports idle and runs
/// the startup synchronization.
pub fn run_watch(config: &Config, interval: Option<u64>) -> Result<()> {
    let seconds = interval.unwrap_or(config.server.poll_interval).max(1);
    let running = start(config)?;

    println!(
        "{} Watching {} shadow folder(s) every {}s",
        "=>".blue().bold(),
        running.controllers.len(),
        seconds
    );

    loop {
        match running.server.poll() {
            Ok(report) if !report.idle => tracing::debug!(
                streams_created = report.streams_created,
                changes_submitted = report.changes_submitted,
                "Poll delivered events"
            ),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Poll failed"),
        }
        thread::sleep(Duration::from_secs(seconds));
    }
}
