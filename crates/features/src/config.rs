//! Parameters of the feature stage.

use serde::{Deserialize, Serialize};

use crate::{
    MarketModelConfig, MomentumConfig, RealizedVolConfig, RiskFreeConfig, TailRiskConfig,
    VolumeShockConfig,
};

/// Parameters for every built-in feature and the benchmark builder.
///
/// Any section left out of a config file takes its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Reversal and momentum look-backs.
    pub momentum: MomentumConfig,
    /// VaR/ES window and tail level.
    pub tail_risk: TailRiskConfig,
    /// Rolling CAPM window.
    pub market_model: MarketModelConfig,
    /// Yang–Zhang window.
    pub realized_vol: RealizedVolConfig,
    /// Volume-shock windows.
    pub volume_shock: VolumeShockConfig,
    /// Risk-free table layout.
    pub risk_free: RiskFreeConfig,
}

#[cfg(test)]
mod tests {
    use dynafactor_math::RollingWindow;

    use super::*;

    #[test]
    fn defaults() {
        let config = FeatureConfig::default();
        assert_eq!(config.tail_risk.window, RollingWindow::new(90, 75));
        assert_eq!(config.market_model.window, RollingWindow::new(30, 20));
        assert_eq!(config.realized_vol.window, RollingWindow::new(30, 20));
        assert_eq!(
            config.volume_shock.windows,
            vec![RollingWindow::new(15, 10), RollingWindow::new(30, 20)]
        );
        assert!((config.risk_free.days_per_year - 365.0).abs() < f64::EPSILON);
    }
}
