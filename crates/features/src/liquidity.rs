//! Illiquidity measures: Amihud ratio and a synthetic bid-ask spread.

use dynafactor_primitives::{
    AssetFrame,
    columns::{CLOSE, HIGH, LOW, SIMPLE_RETURN, VOLUME},
};
use dynafactor_traits::{Feature, FeatureColumns, FeatureError, FeatureKind};
use ndarray::Array1;

use crate::series::{clip_unit, input, lagged, positive};

/// Output column of [`AmihudIlliquidity`].
pub const ILLIQ: &str = "illiq";
/// Output column of [`SyntheticSpread`].
pub const BID_ASK: &str = "bid_ask";

/// Amihud illiquidity `|r_t| / volume_t`.
///
/// Pointwise; zero or negative volume gives a missing value.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmihudIlliquidity;

impl Feature for AmihudIlliquidity {
    fn name(&self) -> &str {
        "amihud"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Liquidity
    }

    fn required_columns(&self) -> Vec<String> {
        vec![SIMPLE_RETURN.to_string(), VOLUME.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![ILLIQ.to_string()]
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        let returns = input(frame, SIMPLE_RETURN)?;
        let volume = positive(input(frame, VOLUME)?);
        Ok(vec![(ILLIQ.to_string(), returns.mapv(f64::abs) / volume)])
    }
}

/// Average of the Corwin–Schultz and Abdi–Ranaldo spread estimators.
///
/// Each estimator uses the current and previous bar and is clipped to
/// `[0, 1]` before averaging; the result is missing when either is.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSpread;

const CS_DENOM: f64 = 3.0 - 2.0 * std::f64::consts::SQRT_2;

/// Corwin–Schultz high-low spread over bars `t - 1` and `t`.
pub(crate) fn corwin_schultz(high: &Array1<f64>, low: &Array1<f64>) -> Array1<f64> {
    let prev_high = lagged(high, 1);
    let prev_low = lagged(low, 1);

    Array1::from_shape_fn(high.len(), |t| {
        let beta = (high[t] / low[t]).ln().powi(2) + (prev_high[t] / prev_low[t]).ln().powi(2);
        let gamma = (high[t].max(prev_high[t]) / low[t].min(prev_low[t])).ln().powi(2);
        let alpha = ((2.0 * beta).sqrt() - beta.sqrt()) / CS_DENOM - (gamma / CS_DENOM).sqrt();
        let e = alpha.exp();
        2.0 * (e - 1.0) / (1.0 + e)
    })
}

/// Abdi–Ranaldo close-high-low spread.
pub(crate) fn abdi_ranaldo(high: &Array1<f64>, low: &Array1<f64>, close: &Array1<f64>) -> Array1<f64> {
    let mid = (high + low) / 2.0;
    let prev_mid = lagged(&mid, 1);
    let prev_close = lagged(close, 1);
    let prev_range = lagged(&(high - low), 1);

    Array1::from_shape_fn(high.len(), |t| {
        let eta = 4.0 * (mid[t] - prev_close[t]) * (mid[t] - prev_mid[t])
            - (high[t] - low[t]).powi(2)
            - prev_range[t].powi(2);
        // max() would swallow NaN
        if eta.is_nan() { f64::NAN } else { eta.max(0.0).sqrt() / prev_close[t] }
    })
}

impl Feature for SyntheticSpread {
    fn name(&self) -> &str {
        "synthetic_spread"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Liquidity
    }

    fn required_columns(&self) -> Vec<String> {
        vec![HIGH.to_string(), LOW.to_string(), CLOSE.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![BID_ASK.to_string()]
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        let high = positive(input(frame, HIGH)?);
        let low = positive(input(frame, LOW)?);
        let close = positive(input(frame, CLOSE)?);

        let cs = corwin_schultz(&high, &low).mapv(clip_unit);
        let ar = abdi_ranaldo(&high, &low, &close).mapv(clip_unit);

        Ok(vec![(BID_ASK.to_string(), (cs + ar) / 2.0)])
    }
}
