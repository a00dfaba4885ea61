//! Command implementations for shadow-cli

pub mod check;
pub mod hook;
pub mod sync;
pub mod watch;

use std::sync::Arc;

use colored::{ColoredString, Colorize};
use shadow_core::{Dispatch, MirrorController, SyncOutcome};
use shadow_git::GitServer;

use crate::config::Config;
use crate::error::{CliError, Result};

pub use check::run_check;
pub use hook::run_hook;
pub use sync::run_sync;
pub use watch::run_watch;

/// A git server with every shadow folder that started.
pub struct Running {
    pub server: GitServer,
    pub controllers: Vec<Arc<MirrorController>>,
}

/// Build the git server and start one controller per mirror entry.
///
/// A mirror that fails to start is logged and skipped. It is an error
/// when none starts.
pub fn start(config: &Config) -> Result<Running> {
    let server = open_server(config)?;
    if config.mirror.is_empty() {
        return Err(CliError::user("No mirrors configured"));
    }

    let mut controllers = Vec::new();
    for (index, mirror) in config.mirror.iter().enumerate() {
        match MirrorController::start(mirror, &server) {
            Ok(controller) => controllers.push(controller),
            Err(e) => tracing::error!(mirror = index, error = %e, "Shadow folder failed to start"),
        }
    }

    if controllers.is_empty() {
        return Err(CliError::user("No shadow folder could be started"));
    }
    tracing::debug!(
        started = controllers.len(),
        configured = config.mirror.len(),
        "Shadow folders running"
    );

    Ok(Running {
        server,
        controllers,
    })
}

pub fn open_server(config: &Config) -> Result<GitServer> {
    let root = config.server.root();
    if !root.is_dir() {
        return Err(CliError::user(format!(
            "Server root is not a directory: {}",
            root
        )));
    }
    Ok(GitServer::new(root, config.server.data_dir()?))
}

/// Short label for what a controller did with an event.
pub fn describe(dispatch: Dispatch) -> ColoredString {
    match dispatch {
        Dispatch::Synchronized(SyncOutcome::Success) => "updated".green(),
        Dispatch::Synchronized(SyncOutcome::SoftFailure(code)) => {
            format!("updated with warnings ({})", code).yellow()
        }
        Dispatch::Synchronized(SyncOutcome::HardFailure(code)) => {
            format!("update failed ({})", code).red()
        }
        Dispatch::NotAttempted => "no workspace".red(),
        Dispatch::Ignored => "ignored".dimmed(),
        Dispatch::Malformed => "malformed event".yellow(),
        Dispatch::StreamsRefreshed => "streams refreshed".normal(),
        Dispatch::Skipped => "already primed".dimmed(),
    }
}

/// Whether a dispatch left its shadow folder out of date.
pub fn failed(dispatch: Dispatch) -> bool {
    matches!(
        dispatch,
        Dispatch::NotAttempted | Dispatch::Synchronized(SyncOutcome::HardFailure(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_core::ReturnCode;

    #[test]
    fn test_failed_dispatches() {
        assert!(failed(Dispatch::NotAttempted));
        assert!(failed(Dispatch::Synchronized(SyncOutcome::HardFailure(
            ReturnCode::Failed
        ))));
        assert!(!failed(Dispatch::Synchronized(SyncOutcome::SoftFailure(
            ReturnCode::LocalChangesOverwritten
        ))));
        assert!(!failed(Dispatch::Synchronized(SyncOutcome::Success)));
        assert!(!failed(Dispatch::Skipped));
    }
}
