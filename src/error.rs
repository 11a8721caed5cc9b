//! Error types for mothdev
//!
//! Every failure in a workflow surfaces as a [`DevError`]. A failing external
//! tool becomes [`DevError::CommandFailed`] and carries the tool's exit code so
//! the binary can propagate it unchanged; everything else is an internal error.

use thiserror::Error;

/// Exit code used for failures that did not come from an external tool.
pub const INTERNAL_EXIT_CODE: i32 = 2;

/// The primary error type for mothdev operations.
#[derive(Error, Debug)]
pub enum DevError {
    /// Configuration-related errors (invalid values, unreadable files, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path bridge failures (translator missing, unparsable output, etc.)
    #[error("Path bridge error: {0}")]
    Bridge(String),

    /// The external program could not be started at all
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran and exited unsuccessfully
    #[error("'{program}' exited with code {code}")]
    CommandFailed { program: String, code: i32 },

    /// A required file or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DevError {
    /// Process exit code this error should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            DevError::CommandFailed { code, .. } => *code,
            _ => INTERNAL_EXIT_CODE,
        }
    }
}

/// A specialized `Result` type for mothdev operations.
pub type Result<T> = std::result::Result<T, DevError>;
