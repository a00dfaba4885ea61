//! Streams are local branches of a served repository

use std::fs;
use std::path::PathBuf;

use shadow_core::{Stream, WorkspaceSpec};
use shadow_fs::{NormalizedPath, io};

use crate::naming::{generated_workspace_name, slugify};
use crate::{Error, Result, helpers};

/// A stream backed by a local branch.
#[derive(Debug, Clone)]
pub struct GitStream {
    branch: String,
    path: String,
    repo_path: PathBuf,
}

impl GitStream {
    pub fn new(branch: &str, repo_path: PathBuf) -> Self {
        Self {
            branch: branch.to_string(),
            path: format!("/{}", branch),
            repo_path,
        }
    }

    /// Create the worktree described by `spec` and return its name.
    pub fn create(&self, spec: &WorkspaceSpec) -> Result<String> {
        let name = if spec.name.is_empty() {
            generated_workspace_name(&self.path)
        } else {
            let slug = slugify(&spec.name);
            if slug.is_empty() {
                return Err(Error::InvalidWorkspaceName {
                    name: spec.name.clone(),
                });
            }
            slug
        };
        tracing::debug!(
            name = %name,
            stream = %self.path,
            path = %spec.path,
            "Creating workspace"
        );

        prepare_target(&spec.path)?;

        let repo = git2::Repository::open(&self.repo_path)?;
        helpers::create_tracking_worktree(
            &repo,
            &spec.path.to_native(),
            &name,
            &self.branch,
            &spec.description,
        )?;

        if spec.options.exclusive {
            repo.find_worktree(&name)?.lock(Some(&spec.description))?;
        }

        Ok(name)
    }
}

/// Make room for a new worktree at `path`.
///
/// libgit2 creates the worktree directory itself, so an existing empty
/// directory is removed first. A directory with content is left alone.
fn prepare_target(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();

    if path.is_dir() {
        if !io::is_empty_dir(path)? {
            return Err(Error::TargetNotEmpty { path: native });
        }
        fs::remove_dir(&native).map_err(|e| shadow_fs::Error::io(&native, e))?;
    } else if let Some(parent) = path.parent() {
        io::ensure_dir(&parent)?;
    }

    Ok(())
}

impl Stream for GitStream {
    fn name(&self) -> &str {
        &self.branch
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn create_workspace(&self, spec: &WorkspaceSpec) -> shadow_core::Result<()> {
        self.create(spec)?;
        Ok(())
    }
}
