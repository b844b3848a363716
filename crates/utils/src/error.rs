//! Error types for utility functions.

/// Errors that can occur during utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// One or more required columns are absent.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// The panel has no rows.
    #[error("empty panel")]
    EmptyPanel,

    /// A row carries a null key (symbol or date).
    #[error("null value in key column {column} at row {row}")]
    NullKey {
        /// Key column name.
        column: String,
        /// Row position.
        row: usize,
    },
}
