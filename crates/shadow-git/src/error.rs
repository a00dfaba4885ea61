//! Error types for shadow-git

use std::path::PathBuf;

/// Result type for shadow-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shadow-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] shadow_fs::Error),

    #[error("Repository '{name}' not found")]
    RepositoryNotFound { name: String },

    #[error("Branch '{name}' not found")]
    BranchNotFound { name: String },

    #[error("Branch '{name}' has no upstream stream")]
    NoUpstream { name: String },

    #[error("Target directory {path} exists and is not empty")]
    TargetNotEmpty { path: PathBuf },

    #[error("Invalid workspace name: '{name}'")]
    InvalidWorkspaceName { name: String },

    #[error("Malformed post-receive line: '{line}'")]
    MalformedHookLine { line: String },
}

impl From<Error> for shadow_core::Error {
    fn from(e: Error) -> Self {
        shadow_core::Error::backend(e)
    }
}
