//! Mirror controller for Shadow Folder
//!
//! Keeps a local directory (the shadow folder) in step with the latest
//! content of one stream. The hosting server delivers idle,
//! stream-created and change-submitted events; the controller finds or
//! creates the workspace bound to the folder and updates it to the latest
//! revision.
//!
//! The server itself is reached only through the traits in [`host`].

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod resolver;
pub mod sync;

pub use config::{MirrorConfig, MirrorSettings};
pub use controller::{Dispatch, MirrorController, Phase};
pub use error::{Error, Result};
pub use host::{
    ChangeSubmittedEvent, Connection, EventHandler, Repository, ReturnCode, Stream,
    StreamCreatedEvent, UpdateError, Workspace, WorkspaceOptions, WorkspaceSpec,
};
pub use resolver::{ResolveError, WorkspaceResolver};
pub use sync::{SyncOutcome, synchronize};
