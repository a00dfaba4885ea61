//! Workspaces are linked worktrees of a served repository

use shadow_core::{ReturnCode, UpdateError, Workspace};
use shadow_fs::NormalizedPath;

use crate::{Error, helpers};

/// A linked worktree whose branch tracks a stream.
#[derive(Debug, Clone)]
pub struct GitWorkspace {
    name: String,
    path: NormalizedPath,
}

impl GitWorkspace {
    pub fn new(name: &str, path: NormalizedPath) -> Self {
        Self {
            name: name.to_string(),
            path,
        }
    }
}

impl Workspace for GitWorkspace {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &NormalizedPath {
        &self.path
    }

    fn manages_path(&self, path: &NormalizedPath) -> bool {
        self.path.same_location(path)
    }

    fn update_to_latest(&self) -> Result<ReturnCode, UpdateError> {
        let worktree = git2::Repository::open(self.path.to_native()).map_err(|e| {
            UpdateError::new(ReturnCode::WorkspaceNotFound, e.message().to_string())
        })?;

        match helpers::update_to_upstream(&worktree) {
            Ok(update) => {
                tracing::debug!(
                    workspace = %self.name,
                    commit = %update.commit,
                    "Workspace checked out"
                );
                if update.overwrote_local_changes {
                    Ok(ReturnCode::LocalChangesOverwritten)
                } else {
                    Ok(ReturnCode::Success)
                }
            }
            Err(e @ Error::NoUpstream { .. }) => {
                Err(UpdateError::new(ReturnCode::StreamNotFound, e.to_string()))
            }
            Err(e @ Error::BranchNotFound { .. }) => {
                Err(UpdateError::new(ReturnCode::WorkspaceNotFound, e.to_string()))
            }
            Err(e) => Err(UpdateError::new(ReturnCode::Failed, e.to_string())),
        }
    }
}
