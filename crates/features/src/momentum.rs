//! Short-term reversal and momentum signals.

use dynafactor_math::RollingWindow;
use dynafactor_primitives::{
    AssetFrame,
    columns::{LOG_RETURN, SIMPLE_RETURN},
};
use dynafactor_traits::{ConfigurableFeature, Feature, FeatureColumns, FeatureError, FeatureKind};
use serde::{Deserialize, Serialize};

use crate::series::{input, lagged};

/// Configuration for the reversal/momentum signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Look-back lengths, in rows, of the cumulative log-return signals.
    pub windows: Vec<usize>,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self { windows: vec![7, 14, 21, 30] }
    }
}

/// Reversal (`rev`, `rev_log`) and momentum (`mom_{L}`) characteristics.
///
/// `rev` is the previous row's simple return and `rev_log` its log return.
/// `mom_{L}` sums the `L` log returns before today and is missing unless all
/// `L` are present. Today's return never enters a signal dated today.
#[derive(Debug, Clone)]
pub struct Momentum {
    config: MomentumConfig,
}

impl Momentum {
    /// Create the feature with default look-backs.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MomentumConfig::default())
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::new()
    }
}

impl Feature for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Momentum
    }

    fn required_columns(&self) -> Vec<String> {
        vec![SIMPLE_RETURN.to_string(), LOG_RETURN.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        let mut names = vec!["rev".to_string(), "rev_log".to_string()];
        names.extend(self.config.windows.iter().map(|l| format!("mom_{l}")));
        names
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        if self.config.windows.contains(&0) {
            return Err(FeatureError::InvalidConfig("momentum window must be positive".to_string()));
        }

        let rev = lagged(input(frame, SIMPLE_RETURN)?, 1);
        let rev_log = lagged(input(frame, LOG_RETURN)?, 1);

        let moms: Vec<_> = self
            .config
            .windows
            .iter()
            .map(|&window| (format!("mom_{window}"), RollingWindow::new(window, window).sum(&rev_log)))
            .collect();

        let mut out = vec![("rev".to_string(), rev), ("rev_log".to_string(), rev_log)];
        out.extend(moms);
        Ok(out)
    }
}

impl ConfigurableFeature for Momentum {
    type Config = MomentumConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::test_support::{frame, output};

    #[test]
    fn momentum_config_defaults() {
        assert_eq!(MomentumConfig::default().windows, vec![7, 14, 21, 30]);
        let names = Momentum::new().output_columns();
        assert_eq!(names, ["rev", "rev_log", "mom_7", "mom_14", "mom_21", "mom_30"]);
    }

    #[test]
    fn signals_skip_current_row() {
        let log = vec![f64::NAN, 0.01, 0.02, -0.01, 0.03];
        let simple: Vec<f64> = log.iter().map(|r: &f64| r.exp() - 1.0).collect();
        let frame = frame(&[("simple_return", simple.clone()), ("log_return", log)]);

        let feature = Momentum::with_config(MomentumConfig { windows: vec![2] });
        let out = feature.compute(&frame).unwrap();

        assert_relative_eq!(output(&out, "rev")[2], simple[1], epsilon = 1e-12);
        let mom = output(&out, "mom_2");
        // row 2 needs log returns of rows 0 and 1; row 0 is missing
        assert!(mom[2].is_nan());
        assert_relative_eq!(mom[3], 0.03, epsilon = 1e-12);
        assert_relative_eq!(mom[4], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn zero_window_rejected() {
        let frame = frame(&[("simple_return", vec![0.0]), ("log_return", vec![0.0])]);
        let feature = Momentum::with_config(MomentumConfig { windows: vec![0] });
        assert!(matches!(feature.compute(&frame), Err(FeatureError::InvalidConfig(_))));
    }
}
