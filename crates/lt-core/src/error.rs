//! Error types for lt-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lt-core
#[derive(Debug, Error)]
pub enum Error {
    /// The configured root directory does not exist
    #[error("directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No candidate encoding produced a parseable table
    #[error("failed to decode '{path}' (tried {tried})")]
    Decode { path: PathBuf, tried: String },

    /// Failed to parse CSV
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write a table
    #[error("failed to write '{path}': {message}")]
    Write { path: PathBuf, message: String },

    /// File name rejected before any write
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// Target file already exists
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    /// No table with that name under the root
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// Column lookup failed
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Row index past the end of the table
    #[error("row {row} out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
