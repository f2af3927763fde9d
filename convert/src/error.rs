//! Error types for conversion runs.

use tabular_schema_core::ValidationError;
use thiserror::Error;

/// Errors that abort a conversion run.
///
/// Key collisions are not errors; they are reported in the run outcome.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A table failed structural validation.
    #[error("table '{table}' is invalid: {source}")]
    InvalidTable {
        table: String,
        #[source]
        source: ValidationError,
    },

    /// The run was given no tables at all.
    #[error("no tables to convert")]
    NoTables,
}

/// Convenience alias for results with [`ConvertError`].
pub type Result<T> = std::result::Result<T, ConvertError>;
