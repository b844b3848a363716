//! Error types for feature construction.

use dynafactor_math::MathError;
use dynafactor_traits::FeatureError;
use dynafactor_utils::UtilsError;

/// Errors that abort a feature stage.
///
/// Per-asset problems are not reported here; they are collected as
/// [`AssetFailure`](crate::AssetFailure) records.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Panel utility error (missing columns, bad keys, I/O).
    #[error(transparent)]
    Utils(#[from] UtilsError),

    /// Feature definition error.
    #[error("feature error: {0}")]
    Feature(#[from] FeatureError),

    /// Math operation error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Whether the stage failed because the input table lacks columns.
    #[must_use]
    pub const fn is_missing_columns(&self) -> bool {
        matches!(self, Self::Utils(UtilsError::MissingColumns(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::InvalidConfig("bad parameter".to_string());
        assert!(err.to_string().contains("bad parameter"));

        let err: EngineError = UtilsError::MissingColumns(vec!["volume".to_string()]).into();
        assert!(err.is_missing_columns());
        assert_eq!(err.to_string(), "missing required columns: volume");
    }
}
