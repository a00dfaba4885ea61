//! Traits the hosting server implements for the mirror controller.
//!
//! The controller never owns repositories, streams or workspaces. It holds
//! shared handles to whatever the host hands out and asks the host to act
//! on them.

use std::fmt;
use std::sync::Arc;

use shadow_fs::NormalizedPath;

use crate::Result;

/// Connection to the hosting server.
pub trait Connection: Send + Sync {
    /// Look up a repository by name.
    fn repository_by_name(&self, name: &str) -> Option<Arc<dyn Repository>>;

    /// Host-provided data directory, used to derive default shadow folders.
    fn data_directory(&self) -> NormalizedPath;

    /// Subscribe a handler to idle, stream-created and change-submitted
    /// events.
    fn register(&self, handler: Arc<dyn EventHandler>);
}

/// A repository on the hosting server.
pub trait Repository: Send + Sync {
    fn name(&self) -> &str;

    /// Find a stream by path or alias.
    ///
    /// Only streams in the repository's cached stream list are visible;
    /// see [`Repository::refresh_streams`].
    fn stream_by_path(&self, path: &str) -> Option<Arc<dyn Stream>>;

    /// Reload the cached stream list.
    fn refresh_streams(&self);

    /// All workspaces currently known to this repository.
    fn workspaces(&self) -> Result<Vec<Box<dyn Workspace>>>;
}

/// A line of development within a repository.
pub trait Stream: Send + Sync {
    fn name(&self) -> &str;

    /// Canonical stream path, e.g. `/main`.
    fn path(&self) -> &str;

    /// Ask the server to create a workspace bound to this stream.
    ///
    /// Creation does not hand back the new workspace; callers look it up
    /// through [`Repository::workspaces`].
    fn create_workspace(&self, spec: &WorkspaceSpec) -> Result<()>;
}

/// A server-tracked binding between a local directory and a stream.
pub trait Workspace: Send {
    fn name(&self) -> &str;

    /// Root directory of the workspace.
    fn path(&self) -> &NormalizedPath;

    /// Whether this workspace manages `path`.
    fn manages_path(&self, path: &NormalizedPath) -> bool;

    /// Update the workspace to the latest revision of its stream.
    ///
    /// `Ok` means the update ran to completion, possibly with a
    /// non-success code. `Err` means it could not complete.
    fn update_to_latest(&self) -> std::result::Result<ReturnCode, UpdateError>;
}

/// Receiver of host events.
///
/// Implementations must not panic or propagate failures; every error is
/// handled inside the callback.
pub trait EventHandler: Send + Sync {
    /// The host has no pending work.
    fn on_idle(&self);

    /// A stream was created in a repository.
    fn on_stream_created(&self, event: &StreamCreatedEvent);

    /// A change was submitted to a stream.
    fn on_change_submitted(&self, event: &ChangeSubmittedEvent);
}

/// Payload of a stream-created event.
#[derive(Clone, Default)]
pub struct StreamCreatedEvent {
    pub repository: Option<Arc<dyn Repository>>,
}

/// Payload of a change-submitted event.
///
/// Either reference may be missing when the host could not resolve it.
#[derive(Clone, Default)]
pub struct ChangeSubmittedEvent {
    pub repository: Option<Arc<dyn Repository>>,
    pub stream: Option<Arc<dyn Stream>>,
}

/// Parameters for [`Stream::create_workspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSpec {
    /// Workspace name; empty lets the server generate one.
    pub name: String,
    pub path: NormalizedPath,
    pub description: String,
    pub options: WorkspaceOptions,
}

/// Creation flags. Their exact effect belongs to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceOptions {
    /// Prevent other users from working in the workspace.
    pub exclusive: bool,
    /// Materialize files on disk as part of creation.
    pub populate: bool,
    /// Include nested content.
    pub recursive: bool,
}

impl WorkspaceOptions {
    /// Flags for a read-only mirror of a stream.
    pub const fn mirror() -> Self {
        Self {
            exclusive: false,
            populate: true,
            recursive: true,
        }
    }
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self::mirror()
    }
}

/// Diagnostic code attached to an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Success,
    /// Files modified inside the workspace were replaced.
    LocalChangesOverwritten,
    /// The stream the workspace is bound to no longer exists.
    StreamNotFound,
    /// The workspace is no longer registered with the server.
    WorkspaceNotFound,
    Failed,
}

impl ReturnCode {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::LocalChangesOverwritten => "local_changes_overwritten",
            Self::StreamNotFound => "stream_not_found",
            Self::WorkspaceNotFound => "workspace_not_found",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An update that could not complete.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} ({code})")]
pub struct UpdateError {
    pub code: ReturnCode,
    pub message: String,
}

impl UpdateError {
    pub fn new(code: ReturnCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
