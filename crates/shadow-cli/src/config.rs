//! Configuration document for the `shadow-folder` binary

use std::path::Path;

use serde::Deserialize;
use shadow_core::MirrorConfig;
use shadow_fs::{ConfigStore, NormalizedPath};

use crate::error::{CliError, Result};

const DEFAULT_POLL_INTERVAL: u64 = 5;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL
}

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,

    /// One entry per shadow folder
    #[serde(default)]
    pub mirror: Vec<MirrorConfig>,
}

/// The `[server]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Directory holding the served repositories
    pub root: String,

    /// Host data directory, the base for mirrors without a `path`
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Seconds between polls in `watch`
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Config {
    /// Load a configuration file, resolving relative server and mirror
    /// paths against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let file = NormalizedPath::new(path);
        if !file.exists() {
            return Err(CliError::user(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let mut config: Config = ConfigStore::new().load(&file)?;
        let base = path.parent().unwrap_or(Path::new(""));

        config.server.root = anchor(base, &config.server.root);
        config.server.data_dir = config.server.data_dir.map(|dir| anchor(base, &dir));
        for mirror in &mut config.mirror {
            mirror.path = mirror.path.take().map(|path| anchor(base, &path));
        }

        tracing::debug!(
            config = %file,
            root = %config.server.root,
            mirrors = config.mirror.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

impl ServerConfig {
    pub fn root(&self) -> NormalizedPath {
        NormalizedPath::new(&self.root)
    }

    /// Configured data directory, or `shadow-folder` under the platform
    /// data directory.
    pub fn data_dir(&self) -> Result<NormalizedPath> {
        if let Some(dir) = &self.data_dir {
            return Ok(NormalizedPath::new(dir));
        }
        dirs::data_dir()
            .map(|dir| NormalizedPath::new(dir.join("shadow-folder")))
            .ok_or_else(|| {
                CliError::user("No platform data directory; set server.data_dir in the config")
            })
    }
}

fn anchor(base: &Path, value: &str) -> String {
    let path = Path::new(value);
    if path.is_absolute() || base.as_os_str().is_empty() {
        value.to_string()
    } else {
        base.join(path).to_string_lossy().into_owned()
    }
}
