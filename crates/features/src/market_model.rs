//! Rolling market-model (CAPM) regression.

use dynafactor_math::{RollingWindow, SimpleRegression, simple_regression};
use dynafactor_primitives::{
    AssetFrame,
    columns::{ASSET_EXCESS_RETURN, MARKET_EXCESS_RETURN},
};
use dynafactor_traits::{ConfigurableFeature, Feature, FeatureColumns, FeatureError, FeatureKind};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::series::input;

/// Configuration for the rolling market model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketModelConfig {
    /// Trailing window; `min_obs` counts rows where both returns are present.
    pub window: RollingWindow,
}

impl Default for MarketModelConfig {
    fn default() -> Self {
        Self { window: RollingWindow::new(30, 20) }
    }
}

/// Rolling OLS of asset excess return on market excess return, with intercept.
///
/// Emits `capm_alpha_{W}` (intercept), `capm_beta_{W}` (slope) and
/// `idio_vol_{W}`, the residual standard error `sqrt(SSR / (n - 2))`. A
/// window whose market returns do not vary yields missing values.
#[derive(Debug, Clone)]
pub struct MarketModel {
    config: MarketModelConfig,
}

impl MarketModel {
    /// Create the feature with the default window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MarketModelConfig::default())
    }

    fn columns(&self) -> [String; 3] {
        let w = self.config.window.window;
        [format!("capm_alpha_{w}"), format!("capm_beta_{w}"), format!("idio_vol_{w}")]
    }

    fn rolling(
        &self,
        market: &Array1<f64>,
        asset: &Array1<f64>,
        pick: fn(&SimpleRegression) -> f64,
    ) -> Result<Array1<f64>, FeatureError> {
        self.config
            .window
            .apply_pairs(market, asset, |x, y| simple_regression(x, y).map_or(f64::NAN, |fit| pick(&fit)))
            .map_err(|e| FeatureError::Computation(e.to_string()))
    }
}

impl Default for MarketModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for MarketModel {
    fn name(&self) -> &str {
        "market_model"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::MarketModel
    }

    fn required_columns(&self) -> Vec<String> {
        vec![ASSET_EXCESS_RETURN.to_string(), MARKET_EXCESS_RETURN.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        self.columns().to_vec()
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        self.config.window.validate().map_err(|e| FeatureError::InvalidConfig(e.to_string()))?;

        let asset = input(frame, ASSET_EXCESS_RETURN)?;
        let market = input(frame, MARKET_EXCESS_RETURN)?;

        let alpha = self.rolling(market, asset, |fit| fit.alpha)?;
        let beta = self.rolling(market, asset, |fit| fit.beta)?;
        let idio = self.rolling(market, asset, |fit| fit.residual_std)?;

        let [alpha_col, beta_col, idio_col] = self.columns();
        Ok(vec![(alpha_col, alpha), (beta_col, beta), (idio_col, idio)])
    }
}

impl ConfigurableFeature for MarketModel {
    type Config = MarketModelConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
