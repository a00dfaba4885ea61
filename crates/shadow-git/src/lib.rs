//! Git-backed server for Shadow Folder
//!
//! Serves every git repository under a root directory. Branches are
//! streams; a workspace is a linked worktree whose private branch tracks
//! the stream branch as its upstream.

pub mod error;
pub mod helpers;
pub mod hook;
pub mod naming;
pub mod repository;
pub mod server;
pub mod stream;
pub mod workspace;

pub use error::{Error, Result};
pub use hook::RefUpdate;
pub use repository::GitRepository;
pub use server::{GitServer, PollReport};
pub use stream::GitStream;
pub use workspace::GitWorkspace;

/// Branch namespace reserved for workspace branches.
///
/// Branches under it are never reported as streams.
pub const WORKSPACE_BRANCH_PREFIX: &str = "shadow/";
