//! Feature trait definitions.

use dynafactor_primitives::AssetFrame;
use ndarray::Array1;

/// Named output columns of a feature, each as long as the input frame.
pub type FeatureColumns = Vec<(String, Array1<f64>)>;

/// Errors raised while computing a feature for one asset.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    /// An input column is not present in the asset frame.
    #[error("missing input column: {0}")]
    MissingInput(String),

    /// An input or output column has the wrong number of rows.
    #[error("column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        /// Column name.
        column: String,
        /// Rows in the frame.
        expected: usize,
        /// Rows in the column.
        actual: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Numerical kernel failure.
    #[error("computation failed: {0}")]
    Computation(String),
}

/// The family a feature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    /// Price-derived returns.
    Return,
    /// Lagged and cumulative return signals.
    Momentum,
    /// Left-tail risk of the return distribution.
    TailRisk,
    /// Rolling market-model regression outputs.
    MarketModel,
    /// Realized volatility from OHLC prices.
    Volatility,
    /// Trading cost and price impact measures.
    Liquidity,
    /// Trading activity measures.
    Volume,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Return => write!(f, "return"),
            Self::Momentum => write!(f, "momentum"),
            Self::TailRisk => write!(f, "tail_risk"),
            Self::MarketModel => write!(f, "market_model"),
            Self::Volatility => write!(f, "volatility"),
            Self::Liquidity => write!(f, "liquidity"),
            Self::Volume => write!(f, "volume"),
        }
    }
}

/// A per-asset time-series computation.
///
/// Implementations read the date-ordered columns of one asset and return
/// new columns of the same length. Statistics that are undefined for a row
/// are `NaN`, never zero.
pub trait Feature: Send + Sync + std::fmt::Debug {
    /// Feature name, used in diagnostics.
    fn name(&self) -> &str;

    /// Feature family.
    fn kind(&self) -> FeatureKind;

    /// Columns read from the asset frame.
    fn required_columns(&self) -> Vec<String>;

    /// Columns produced, in the order `compute` returns them.
    fn output_columns(&self) -> Vec<String>;

    /// Compute the output columns for one asset.
    ///
    /// # Errors
    /// Returns [`FeatureError`] when inputs are absent or malformed.
    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError>;
}

/// A feature parameterised by a configuration value.
pub trait ConfigurableFeature: Feature + Sized {
    /// Configuration type.
    type Config: Default + Clone + Send + Sync;

    /// Create the feature from its configuration.
    fn with_config(config: Self::Config) -> Self;

    /// The active configuration.
    fn config(&self) -> &Self::Config;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_kind_display() {
        assert_eq!(FeatureKind::Return.to_string(), "return");
        assert_eq!(FeatureKind::TailRisk.to_string(), "tail_risk");
        assert_eq!(FeatureKind::MarketModel.to_string(), "market_model");
        assert_eq!(FeatureKind::Liquidity.to_string(), "liquidity");
    }

    #[test]
    fn feature_error_display() {
        let err = FeatureError::LengthMismatch { column: "close".to_string(), expected: 10, actual: 9 };
        assert_eq!(err.to_string(), "column close has 9 rows, expected 10");
    }
}
