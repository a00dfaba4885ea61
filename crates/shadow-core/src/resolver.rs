//! Workspace discovery and creation for a shadow folder

use crate::config::MirrorSettings;
use crate::host::{Repository, Workspace, WorkspaceOptions, WorkspaceSpec};

/// Why a workspace could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Failed to list workspaces in repository '{repository}': {source}")]
    Enumeration {
        repository: String,
        #[source]
        source: crate::Error,
    },

    #[error("Failed to create workspace '{path}'. The stream '{stream}' is invalid.")]
    StreamNotFound { path: String, stream: String },

    #[error("Failed to create workspace '{path}': {source}")]
    CreationFailed {
        path: String,
        #[source]
        source: crate::Error,
    },

    #[error("After creating workspace '{path}' the workspace could not be found!")]
    LookupInconsistency { path: String },
}

/// Finds the workspace that manages a mirror's target directory.
///
/// Nothing is cached: every call asks the repository, because workspaces
/// may be created or removed behind the controller's back.
pub struct WorkspaceResolver<'a> {
    settings: &'a MirrorSettings,
}

impl<'a> WorkspaceResolver<'a> {
    pub fn new(settings: &'a MirrorSettings) -> Self {
        Self { settings }
    }

    /// Look up the workspace, creating it when `allow_create` is set.
    ///
    /// Failures are logged and reported as `None`.
    pub fn resolve(
        &self,
        repository: &dyn Repository,
        allow_create: bool,
    ) -> Option<Box<dyn Workspace>> {
        match self.try_resolve(repository, allow_create) {
            Ok(workspace) => workspace,
            Err(e) => {
                tracing::error!(
                    repository = %repository.name(),
                    path = %self.settings.target,
                    "{}",
                    e
                );
                None
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but hands failures to the caller.
    pub fn try_resolve(
        &self,
        repository: &dyn Repository,
        allow_create: bool,
    ) -> Result<Option<Box<dyn Workspace>>, ResolveError> {
        if let Some(workspace) = self.find(repository)? {
            return Ok(Some(workspace));
        }

        if !allow_create {
            return Ok(None);
        }

        let target = &self.settings.target;
        tracing::info!(path = %target, "Workspace does not exist. Will try and create...");

        let stream = repository
            .stream_by_path(&self.settings.stream)
            .ok_or_else(|| ResolveError::StreamNotFound {
                path: target.to_string(),
                stream: self.settings.stream.clone(),
            })?;

        let spec = WorkspaceSpec {
            name: String::new(),
            path: target.clone(),
            description: self.settings.workspace_description(),
            options: WorkspaceOptions::mirror(),
        };
        stream
            .create_workspace(&spec)
            .map_err(|source| ResolveError::CreationFailed {
                path: target.to_string(),
                source,
            })?;
        tracing::info!(path = %target, "Workspace has been created");

        self.find(repository)?
            .map(Some)
            .ok_or_else(|| ResolveError::LookupInconsistency {
                path: target.to_string(),
            })
    }

    fn find(
        &self,
        repository: &dyn Repository,
    ) -> Result<Option<Box<dyn Workspace>>, ResolveError> {
        let target = &self.settings.target;
        tracing::info!(path = %target, "Looking for workspace");

        let workspaces = repository
            .workspaces()
            .map_err(|source| ResolveError::Enumeration {
                repository: repository.name().to_string(),
                source,
            })?;

        let found = workspaces.into_iter().find(|ws| ws.manages_path(target));
        match &found {
            Some(ws) => tracing::info!(path = %target, workspace = %ws.name(), "Found workspace"),
            None => tracing::info!(path = %target, "Failed to find workspace for path"),
        }
        Ok(found)
    }
}
