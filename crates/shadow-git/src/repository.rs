//! A served git repository

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use git2::Oid;
use shadow_core::{Repository, Stream, Workspace};
use shadow_fs::NormalizedPath;

use crate::stream::GitStream;
use crate::workspace::GitWorkspace;
use crate::{Result, helpers};

/// Strip the accepted alias forms down to a branch name.
///
/// `/main`, `main` and `refs/heads/main` all name the branch `main`.
fn branch_from_alias(path: &str) -> &str {
    let path = path.trim();
    path.strip_prefix("refs/heads/")
        .unwrap_or(path)
        .trim_start_matches('/')
}

/// A git repository served under the server root.
///
/// The stream list is loaded once and only reloaded by
/// [`Repository::refresh_streams`], which is what stream-created events
/// are for.
#[derive(Debug)]
pub struct GitRepository {
    name: String,
    path: PathBuf,
    streams: Mutex<Option<Vec<String>>>,
}

impl GitRepository {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            streams: Mutex::new(None),
        }
    }

    /// Location of the repository on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<git2::Repository> {
        Ok(git2::Repository::open(&self.path)?)
    }

    /// Current stream branches and their tips.
    pub fn branch_tips(&self) -> Result<Vec<(String, Oid)>> {
        let repo = self.open()?;
        helpers::stream_branches(&repo)
    }

    /// Stream handle for a branch known to exist, bypassing the cache.
    pub fn stream_for_branch(&self, branch: &str) -> Arc<dyn Stream> {
        Arc::new(GitStream::new(branch, self.path.clone()))
    }

    fn load_streams(&self) -> Vec<String> {
        match self.branch_tips() {
            Ok(tips) => tips.into_iter().map(|(name, _)| name).collect(),
            Err(e) => {
                tracing::warn!(repository = %self.name, error = %e, "Failed to list streams");
                Vec::new()
            }
        }
    }
}

impl Repository for GitRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn stream_by_path(&self, path: &str) -> Option<Arc<dyn Stream>> {
        let wanted = branch_from_alias(path);
        if wanted.is_empty() {
            return None;
        }

        let mut cache = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        let streams = cache.get_or_insert_with(|| self.load_streams());

        let branch = streams
            .iter()
            .find(|s| s.as_str() == wanted)
            .or_else(|| streams.iter().find(|s| s.eq_ignore_ascii_case(wanted)))?;
        Some(self.stream_for_branch(branch))
    }

    fn refresh_streams(&self) {
        let streams = self.load_streams();
        tracing::debug!(repository = %self.name, count = streams.len(), "Refreshed streams");
        *self.streams.lock().unwrap_or_else(PoisonError::into_inner) = Some(streams);
    }

    fn workspaces(&self) -> shadow_core::Result<Vec<Box<dyn Workspace>>> {
        let repo = self.open()?;
        let mut result: Vec<Box<dyn Workspace>> = Vec::new();

        for name in repo.worktrees().map_err(crate::Error::from)?.iter().flatten() {
            let wt = repo.find_worktree(name).map_err(crate::Error::from)?;
            if wt.validate().is_err() {
                tracing::debug!(worktree = %name, "Skipping stale worktree");
                continue;
            }

            result.push(Box::new(GitWorkspace::new(name, NormalizedPath::new(wt.path()))));
        }

        Ok(result)
    }
}
