//! Shared git2 helper functions for streams and workspaces
//!
//! These functions encapsulate the git2 patterns used by the repository,
//! stream and workspace implementations.

use std::path::Path;

use git2::{BranchType, Oid, Repository, Status, StatusOptions, WorktreeAddOptions};

use crate::naming::workspace_branch;
use crate::{Error, Result, WORKSPACE_BRANCH_PREFIX};

/// Local branches that count as streams, with their tips, sorted by name.
///
/// Workspace branches and unborn branches are skipped.
pub fn stream_branches(repo: &Repository) -> Result<Vec<(String, Oid)>> {
    let mut result = Vec::new();

    for entry in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = entry?;
        let Some(name) = branch.name()? else {
            continue;
        };
        if name.starts_with(WORKSPACE_BRANCH_PREFIX) {
            continue;
        }
        if let Some(tip) = branch.get().target() {
            result.push((name.to_string(), tip));
        }
    }

    result.sort();
    Ok(result)
}

/// Create a worktree on a new branch that tracks `stream`.
///
/// The new branch is `shadow/<worktree_name>`, based on the tip of
/// `stream` and configured with `stream` as its upstream, so updates can
/// find the stream again without extra bookkeeping. The branch is removed
/// again if the worktree cannot be added.
///
/// # Arguments
/// * `repo` - The served repository
/// * `worktree_path` - Where to create the worktree (must not exist)
/// * `worktree_name` - Worktree name, also used for the branch
/// * `stream` - Branch name of the stream to track
/// * `description` - Stored as the git branch description
pub fn create_tracking_worktree(
    repo: &Repository,
    worktree_path: &Path,
    worktree_name: &str,
    stream: &str,
    description: &str,
) -> Result<()> {
    let base = repo
        .find_branch(stream, BranchType::Local)
        .map_err(|_| Error::BranchNotFound {
            name: stream.to_string(),
        })?;
    let base_commit = base.get().peel_to_commit()?;

    let branch_name = workspace_branch(worktree_name);
    let mut new_branch = repo.branch(&branch_name, &base_commit, false)?;
    new_branch.set_upstream(Some(stream))?;
    repo.config()?
        .set_str(&format!("branch.{}.description", branch_name), description)?;
    let new_branch_ref = new_branch.into_reference();

    let mut opts = WorktreeAddOptions::new();
    opts.reference(Some(&new_branch_ref));

    if let Err(e) = repo.worktree(worktree_name, worktree_path, Some(&opts)) {
        if let Ok(mut branch) = repo.find_branch(&branch_name, BranchType::Local)
            && let Err(cleanup) = branch.delete()
        {
            tracing::warn!(
                branch = %branch_name,
                error = %cleanup,
                "Failed to delete branch after worktree creation failed"
            );
        }
        return Err(e.into());
    }

    Ok(())
}

/// Whether tracked files in `repo`'s working directory differ from HEAD.
pub fn has_local_changes(repo: &Repository) -> Result<bool> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(false).include_ignored(false);

    let statuses = repo.statuses(Some(&mut opts))?;
    Ok(statuses.iter().any(|entry| entry.status() != Status::CURRENT))
}

/// Outcome of [`update_to_upstream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamUpdate {
    /// Commit now checked out
    pub commit: Oid,
    /// Whether local modifications were overwritten
    pub overwrote_local_changes: bool,
}

/// Move the branch checked out in `worktree` to its upstream tip and
/// force the working directory to match.
pub fn update_to_upstream(worktree: &Repository) -> Result<UpstreamUpdate> {
    let head = worktree.head()?;
    if !head.is_branch() {
        return Err(Error::NoUpstream {
            name: "HEAD".to_string(),
        });
    }
    let name = head.shorthand().unwrap_or("HEAD").to_string();

    let branch = worktree
        .find_branch(&name, BranchType::Local)
        .map_err(|_| Error::BranchNotFound { name: name.clone() })?;
    let upstream = branch
        .upstream()
        .map_err(|_| Error::NoUpstream { name: name.clone() })?;
    let target = upstream.get().peel_to_commit()?;

    let overwrote_local_changes = has_local_changes(worktree)?;

    let mut reference = branch.into_reference();
    if reference.target() != Some(target.id()) {
        reference.set_target(target.id(), &format!("shadow-folder: update to {}", target.id()))?;
    }
    worktree.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;

    Ok(UpstreamUpdate {
        commit: target.id(),
        overwrote_local_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stream_branches_on_empty_repository() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init_bare(temp_dir.path()).unwrap();

        assert!(stream_branches(&repo).unwrap().is_empty());
    }
}
