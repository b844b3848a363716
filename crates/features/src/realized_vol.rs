//! Yang–Zhang realized volatility from daily OHLC bars.

use dynafactor_math::RollingWindow;
use dynafactor_primitives::{
    AssetFrame,
    columns::{CLOSE, HIGH, LOW, OPEN},
};
use dynafactor_traits::{ConfigurableFeature, Feature, FeatureColumns, FeatureError, FeatureKind};
use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

use crate::series::{input, lagged, positive};

/// Configuration for [`YangZhang`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealizedVolConfig {
    /// Trailing window over daily bars.
    pub window: RollingWindow,
}

impl Default for RealizedVolConfig {
    fn default() -> Self {
        Self { window: RollingWindow::new(30, 20) }
    }
}

/// Yang–Zhang volatility, `rvol_yz_{W}`.
///
/// Combines overnight variance, open-to-close variance and the mean
/// Rogers–Satchell range term with weight
/// `k = 0.34 / (1.34 + (n + 1) / (n - 1))`, where `n` counts the valid bars
/// in the window. A bar is valid only if its open, high, low, close and the
/// previous close are all strictly positive. Negative totals are reported as
/// missing.
#[derive(Debug, Clone)]
pub struct YangZhang {
    config: RealizedVolConfig,
}

impl YangZhang {
    /// Create the feature with the default window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RealizedVolConfig::default())
    }

    /// Output column name.
    #[must_use]
    pub fn column(&self) -> String {
        format!("rvol_yz_{}", self.config.window.window)
    }
}

impl Default for YangZhang {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-bar components `(ln_o, ln_c, rs)`, all `NaN` on invalid bars.
fn components(
    open: &Array1<f64>,
    high: &Array1<f64>,
    low: &Array1<f64>,
    close: &Array1<f64>,
) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
    let prev_close = lagged(close, 1);
    let n = open.len();
    let mut ln_o = Array1::from_elem(n, f64::NAN);
    let mut ln_c = Array1::from_elem(n, f64::NAN);
    let mut rs = Array1::from_elem(n, f64::NAN);

    for t in 0..n {
        let (o, h, l, c, pc) = (open[t], high[t], low[t], close[t], prev_close[t]);
        if !(o.is_finite() && h.is_finite() && l.is_finite() && c.is_finite() && pc.is_finite()) {
            continue;
        }
        let lc = (c / o).ln();
        let lh = (h / o).ln();
        let ll = (l / o).ln();
        ln_o[t] = (o / pc).ln();
        ln_c[t] = lc;
        rs[t] = lh * (lh - lc) + ll * (ll - lc);
    }

    (ln_o, ln_c, rs)
}

impl Feature for YangZhang {
    fn name(&self) -> &str {
        "yang_zhang"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Volatility
    }

    fn required_columns(&self) -> Vec<String> {
        [OPEN, HIGH, LOW, CLOSE].iter().map(ToString::to_string).collect()
    }

    fn output_columns(&self) -> Vec<String> {
        vec![self.column()]
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        let window = self.config.window;
        window.validate().map_err(|e| FeatureError::InvalidConfig(e.to_string()))?;

        let open = positive(input(frame, OPEN)?);
        let high = positive(input(frame, HIGH)?);
        let low = positive(input(frame, LOW)?);
        let close = positive(input(frame, CLOSE)?);

        let (ln_o, ln_c, rs) = components(&open, &high, &low, &close);

        let n = window.count(&ln_o);
        let var_o = window.var(&ln_o);
        let var_c = window.var(&ln_c);
        let mean_rs = window.mean(&rs);

        let mut vol = Array1::from_elem(frame.len(), f64::NAN);
        Zip::from(&mut vol).and(&n).and(&var_o).and(&var_c).and(&mean_rs).for_each(
            |out, &n, &vo, &vc, &mrs| {
                if !(n > 1.0) {
                    return;
                }
                let k = 0.34 / (1.34 + (n + 1.0) / (n - 1.0));
                let total = vo + k * vc + (1.0 - k) * mrs;
                if total >= 0.0 {
                    *out = total.sqrt();
                }
            },
        );

        Ok(vec![(self.column(), vol)])
    }
}

impl ConfigurableFeature for YangZhang {
    type Config = RealizedVolConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}
