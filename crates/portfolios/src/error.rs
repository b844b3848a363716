//! Error types for factor construction.

use dynafactor_utils::UtilsError;

/// Errors that can occur while building factors.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    /// Panel utility error (missing columns, null keys, I/O).
    #[error(transparent)]
    Utils(#[from] UtilsError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// A factor descriptor cannot be applied.
    #[error("invalid descriptor for factor {factor}: {reason}")]
    InvalidDescriptor {
        /// Factor name.
        factor: String,
        /// What is wrong with it.
        reason: String,
    },
}
