//! Error types for shadow-core

use std::path::PathBuf;

/// Result type for shadow-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while starting or running a mirror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or unknown repository/stream in the configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The shadow folder could not be created
    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: shadow_fs::Error,
    },

    /// A call into the hosting server failed
    #[error("Backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn backend(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(source.into())
    }
}
