//! Common error types for sked

use thiserror::Error;

/// Common result type for sked operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across sked crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input text could not be parsed at a given line
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),
}
