//! Filesystem helpers for Shadow Folder
//!
//! Provides normalized path handling, directory preparation and
//! format-agnostic configuration loading.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
