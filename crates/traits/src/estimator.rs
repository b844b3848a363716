//! Pooled regression trait definitions.

use dynafactor_primitives::FactorTable;
use polars::prelude::*;

/// Errors that can occur during estimation.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// Dimension mismatch in input data.
    #[error("dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
        /// Context description.
        context: String,
    },

    /// Insufficient data for estimation.
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations.
        required: usize,
        /// Actual number of observations.
        actual: usize,
    },

    /// No row survived alignment and filtering.
    #[error("empty modelling panel: {0}")]
    EmptyPanel(String),

    /// Polars error.
    #[error("data processing error: {0}")]
    Polars(#[from] PolarsError),

    /// Required panel columns are absent.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Requested factors are absent from the factor table.
    #[error("missing factors: {}", .0.join(", "))]
    MissingFactors(Vec<String>),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Linear algebra error.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(String),
}

impl EstimatorError {
    /// Returns whether this error is recoverable.
    ///
    /// Recoverable errors concern the data of one fit; other fits on the
    /// same inputs may still succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData { .. } | Self::EmptyPanel(_))
    }
}

/// A regression of a `(symbol, date)` panel on a date-indexed factor table.
pub trait PanelEstimator: Send + Sync {
    /// Configuration type for this estimator.
    type Config: Default + Clone + Send + Sync;

    /// Fitted model.
    type Fit;

    /// Create a new estimator with the given configuration.
    fn with_config(config: Self::Config) -> Self
    where
        Self: Sized;

    /// The active configuration.
    fn config(&self) -> &Self::Config;

    /// Panel columns the fit reads.
    fn required_columns(&self) -> Vec<String>;

    /// Fit the model.
    ///
    /// # Arguments
    /// * `panel` - Frame with | symbol | date | return | characteristics... |
    /// * `factors` - Factor returns keyed by date
    ///
    /// # Errors
    /// Returns `EstimatorError` if required columns are missing, the
    /// modelling panel is empty or the solve fails.
    fn fit(&self, panel: &DataFrame, factors: &FactorTable) -> Result<Self::Fit, EstimatorError>;
}
