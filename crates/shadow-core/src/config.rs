//! Mirror configuration and its startup resolution

use std::sync::Arc;

use serde::Deserialize;
use shadow_fs::NormalizedPath;

use crate::host::{Connection, Repository};
use crate::{Error, Result};

/// One mirror entry as written in the configuration document.
///
/// Required fields are optional here so that a missing value surfaces as
/// a configuration error naming the field rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    /// Target repository name
    #[serde(default)]
    pub repository: Option<String>,

    /// Target stream path or alias
    #[serde(default)]
    pub stream: Option<String>,

    /// Target directory; defaults to `<data dir>/<stream path>`
    #[serde(default)]
    pub path: Option<String>,
}

/// A mirror after resolution against the connected server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSettings {
    /// Repository name as the server reports it
    pub repository: String,

    /// Canonical stream path
    pub stream: String,

    /// Shadow folder location
    pub target: NormalizedPath,
}

impl MirrorSettings {
    /// Description given to a workspace created for this mirror.
    pub fn workspace_description(&self) -> String {
        format!("'{}' Shadow Folder", self.stream)
    }

    /// Whether an event for `repository`/`stream` concerns this mirror.
    pub fn matches(&self, repository: &str, stream: &str) -> bool {
        repository.to_lowercase() == self.repository.to_lowercase()
            && stream.to_lowercase() == self.stream.to_lowercase()
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl MirrorConfig {
    pub fn new(repository: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            repository: Some(repository.into()),
            stream: Some(stream.into()),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Resolve names against the server and work out the target directory.
    ///
    /// Does not touch the filesystem.
    pub fn resolve(
        &self,
        connection: &dyn Connection,
    ) -> Result<(Arc<dyn Repository>, MirrorSettings)> {
        let repository_name = non_empty(self.repository.as_ref())
            .ok_or_else(|| Error::config("You must specify a repository in the config file."))?;

        let repository = connection.repository_by_name(repository_name).ok_or_else(|| {
            Error::config(format!("The repository '{}' does not exist.", repository_name))
        })?;

        let stream_path = non_empty(self.stream.as_ref())
            .ok_or_else(|| Error::config("You must specify a stream in the config file."))?;

        let stream = repository.stream_by_path(stream_path).ok_or_else(|| {
            Error::config(format!("The stream '{}' does not exist.", stream_path))
        })?;
        let stream = stream.path().to_string();

        let target = match non_empty(self.path.as_ref()) {
            Some(path) => NormalizedPath::new(path),
            None => connection.data_directory().join(&stream),
        };

        let settings = MirrorSettings {
            repository: repository.name().to_string(),
            stream,
            target,
        };
        Ok((repository, settings))
    }
}
