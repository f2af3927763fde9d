//! Error types for table and definition storage.
//!
//! Covers every failure at the file boundary: I/O, CSV decoding, JSON and
//! YAML (de)serialization, malformed rows, and invalid inputs such as a
//! missing table directory.

use tabular_schema_core::ValidationError;
use thiserror::Error;

/// Errors that can occur while reading tables or writing definitions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV decoding failure.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A table row could not be turned into a record.
    #[error("{table}, row {row}: {source}")]
    InvalidRecord {
        table: String,
        row: usize,
        #[source]
        source: ValidationError,
    },

    /// Output formatting failure.
    #[error("format error: {0}")]
    FormatError(String),

    /// Missing directory, unexpected document shape, and similar.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
