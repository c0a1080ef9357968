//! Error types for GitPulse

use thiserror::Error;

/// Result type alias for GitPulse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for GitPulse operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The external git invocation exited non-zero
    ///
    /// Carries the tool's own diagnostic text: stderr, falling back to
    /// stdout, falling back to a generic message. Callers decide whether
    /// the failure is expected (e.g. a missing ref) or fatal.
    #[error("git error: {message}")]
    ExternalTool {
        /// Diagnostic text from the tool
        message: String,
    },

    /// Captured subprocess output exceeded the configured ceiling
    #[error("command output exceeded {limit} bytes")]
    OutputTooLarge {
        /// The configured ceiling in bytes
        limit: usize,
    },

    /// A branch/ref name failed the syntax allow-list
    #[error("invalid ref name: {name:?}")]
    InvalidRef {
        /// The rejected name
        name: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
