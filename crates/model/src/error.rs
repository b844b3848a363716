//! Error types for factor model estimation.

use dynafactor_math::MathError;
use dynafactor_traits::EstimatorError;
use dynafactor_utils::UtilsError;

/// Errors that can occur during factor model estimation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Estimator error.
    #[error("estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Panel utility error.
    #[error(transparent)]
    Utils(#[from] UtilsError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ModelError {
    /// Returns whether this error is recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Estimator(err) => err.is_recoverable(),
            _ => false,
        }
    }
}

/// Map a panel utility failure onto the estimator error space.
pub(crate) fn from_utils(err: UtilsError) -> EstimatorError {
    match err {
        UtilsError::MissingColumns(columns) => EstimatorError::MissingColumns(columns),
        UtilsError::Polars(err) => EstimatorError::Polars(err),
        UtilsError::EmptyPanel => EstimatorError::EmptyPanel("input panel has no rows".to_string()),
        other => EstimatorError::InvalidConfig(other.to_string()),
    }
}

/// Numerical failures of a pooled solve.
pub(crate) fn from_math(err: MathError) -> EstimatorError {
    EstimatorError::LinearAlgebra(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::InvalidConfig("no characteristics".to_string());
        assert!(err.to_string().contains("no characteristics"));
    }

    #[test]
    fn error_is_recoverable() {
        let err = ModelError::from(EstimatorError::EmptyPanel("FF2".to_string()));
        assert!(err.is_recoverable());

        let err = ModelError::InvalidConfig("test".to_string());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn utils_errors_keep_missing_columns() {
        let err = from_utils(UtilsError::MissingColumns(vec!["illiq".to_string()]));
        assert!(matches!(err, EstimatorError::MissingColumns(c) if c == ["illiq"]));
    }
}
