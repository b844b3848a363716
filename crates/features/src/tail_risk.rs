//! Historical Value-at-Risk and Expected Shortfall.

use dynafactor_math::{RollingWindow, expected_shortfall, quantile_linear};
use dynafactor_primitives::{AssetFrame, columns::LOG_RETURN};
use dynafactor_traits::{ConfigurableFeature, Feature, FeatureColumns, FeatureError, FeatureKind};
use serde::{Deserialize, Serialize};

use crate::series::input;

/// Configuration for tail-risk features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailRiskConfig {
    /// Trailing window over log returns.
    pub window: RollingWindow,
    /// Left-tail probability.
    pub level: f64,
}

impl Default for TailRiskConfig {
    fn default() -> Self {
        Self { window: RollingWindow::new(90, 75), level: 0.05 }
    }
}

/// Rolling VaR and ES of daily log returns.
///
/// VaR is the `level` quantile of the trailing window (linear
/// interpolation); ES is the mean of the window values at or below that
/// quantile. Both are reported as returns, so losses are negative and
/// `ES <= VaR` on every row where both are defined.
#[derive(Debug, Clone)]
pub struct TailRisk {
    config: TailRiskConfig,
}

impl TailRisk {
    /// Create the feature with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TailRiskConfig::default())
    }

    fn suffix(&self) -> String {
        let pct = (self.config.level * 100.0).round() as u32;
        format!("{pct}_{}", self.config.window.window)
    }

    /// Name of the VaR column, e.g. `var5_90`.
    #[must_use]
    pub fn var_column(&self) -> String {
        format!("var{}", self.suffix())
    }

    /// Name of the ES column, e.g. `es5_90`.
    #[must_use]
    pub fn es_column(&self) -> String {
        format!("es{}", self.suffix())
    }
}

impl Default for TailRisk {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for TailRisk {
    fn name(&self) -> &str {
        "tail_risk"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::TailRisk
    }

    fn required_columns(&self) -> Vec<String> {
        vec![LOG_RETURN.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.var_column(), self.es_column()]
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        let TailRiskConfig { window, level } = self.config;
        window.validate().map_err(|e| FeatureError::InvalidConfig(e.to_string()))?;
        if !(level > 0.0 && level < 1.0) {
            return Err(FeatureError::InvalidConfig(format!("tail level {level} not in (0, 1)")));
        }

        let returns = input(frame, LOG_RETURN)?;
        let var = window.apply(returns, |v| quantile_linear(v, level));
        let es = window.apply(returns, |v| expected_shortfall(v, level));

        Ok(vec![(self.var_column(), var), (self.es_column(), es)])
    }
}

impl ConfigurableFeature for TailRisk {
    type Config = TailRiskConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
