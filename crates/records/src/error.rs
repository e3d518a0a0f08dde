//! Error types for the records crate.
//!
//! Loading a candidate batch is the only fallible operation here; the
//! record and result types themselves are infallible to construct.

use thiserror::Error;

/// Errors that can occur while loading or parsing a candidate batch
#[derive(Error, Debug)]
pub enum RecordError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The document is not valid JSON at all
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON parsed, but is neither a record array nor a search response
    #[error("Unrecognized candidate document: {0}")]
    UnrecognizedShape(String),

    /// A single record is missing a required field or has the wrong type
    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecordError>;
