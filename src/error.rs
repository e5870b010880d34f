//! Error types for docshelf.

use thiserror::Error;

/// Common error type for docshelf.
#[derive(Error, Debug)]
pub enum DocshelfError {
    /// Rejected client input (disallowed file type, empty batch, missing ids).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// I/O error from the storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The durable index file could not be read or written.
    #[error("index error: {0}")]
    Index(String),

    /// Archive construction error.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for DocshelfError {
    fn from(e: serde_json::Error) -> Self {
        DocshelfError::Index(e.to_string())
    }
}

/// Result type alias for docshelf operations.
pub type Result<T> = std::result::Result<T, DocshelfError>;
