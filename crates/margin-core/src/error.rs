//! Error types for margin.

use thiserror::Error;

/// Result type alias using margin's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for margin operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No note with the given title exists in the catalog
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// A note with the given title already exists
    #[error("Duplicate title: {0}")]
    DuplicateTitle(String),

    /// Configuration error (no workspace root, bad option value)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage backend operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input (empty title, malformed tag string)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
