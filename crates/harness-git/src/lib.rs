//! Git subprocess boundary for the community-sync harness.
//!
//! All repository inspection goes through standard git subcommands invoked
//! as subprocesses; the harness depends only on their textual output. This
//! keeps the harness's view of a repository identical to the view of the
//! shell scripts it validates.
//!
//! # Modules
//!
//! - [`git`] — low-level `git` command invocation helpers
//! - [`snapshot`] — [`RepositorySnapshot`] capture

pub mod error;
pub mod git;
pub mod snapshot;

pub use error::{Error, Result};
pub use snapshot::{CaptureOptions, CommitEntry, RepositorySnapshot, capture, patch_id};
