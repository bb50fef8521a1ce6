//! Error types for harness-core

/// Result type for harness-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building fixtures, running operations,
/// or evaluating scenario expectations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fixture construction or precondition violation
    #[error("Fixture error: {message}")]
    Fixture { message: String },

    /// The external operation exceeded its time bound
    #[error("Operation '{name}' timed out after {seconds}s")]
    Timeout { name: String, seconds: u64 },

    /// A scenario referenced a predicate the validator does not know
    #[error("Unknown predicate: '{name}'")]
    UnknownPredicate { name: String },

    /// Malformed scenario definition
    #[error("Invalid scenario: {message}")]
    Scenario { message: String },

    /// Git inspection error from harness-git
    #[error(transparent)]
    Git(#[from] harness_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    /// Create a new fixture error with the given message
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Create a new scenario-definition error with the given message
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario {
            message: message.into(),
        }
    }
}
