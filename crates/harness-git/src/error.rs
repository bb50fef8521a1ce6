//! Error types for harness-git

use std::path::PathBuf;

/// Result type for harness-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when inspecting repositories
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path does not point at a git repository
    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    /// A git subcommand exited non-zero
    #[error("`git {args}` failed with exit code {code}: {stderr}")]
    CommandFailed {
        args: String,
        code: i32,
        stderr: String,
    },

    /// A git subcommand succeeded but produced output the harness could
    /// not interpret
    #[error("Unexpected output from `git {args}`: {output:?}")]
    UnexpectedOutput { args: String, output: String },

    /// Failed to spawn or talk to the git process
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
