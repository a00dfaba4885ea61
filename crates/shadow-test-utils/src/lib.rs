//! Shared test utilities for the shadow-folder workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`git`]: bare repository fixtures built with `git2`
//! - [`host`]: an in-memory host that records every call the controller makes

pub mod git;
pub mod host;

pub use host::{CreateBehavior, FakeConnection, FakeRepository, UpdateBehavior};
