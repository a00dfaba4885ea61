//! Update a resolved workspace to the latest revision

use crate::host::{ReturnCode, Workspace};

/// Result of one synchronization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Success,
    /// The update completed but reported a non-success code.
    SoftFailure(ReturnCode),
    /// The update could not complete.
    HardFailure(ReturnCode),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Bring `workspace` up to the latest revision of its stream.
///
/// Failures are only logged; nothing is retried.
pub fn synchronize(workspace: &dyn Workspace) -> SyncOutcome {
    let path = workspace.path();
    tracing::info!(path = %path, "Updating workspace");

    match workspace.update_to_latest() {
        Err(e) => {
            tracing::error!(path = %path, code = %e.code, "Failed to update workspace: {}", e.message);
            SyncOutcome::HardFailure(e.code)
        }
        Ok(code) if !code.is_success() => {
            tracing::warn!(
                path = %path,
                code = %code,
                "Updating workspace returned non-successful return code"
            );
            SyncOutcome::SoftFailure(code)
        }
        Ok(_) => {
            tracing::info!(path = %path, "Successfully updated workspace");
            SyncOutcome::Success
        }
    }
}
