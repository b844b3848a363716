//! Daily log and simple returns.

use dynafactor_primitives::{
    AssetFrame,
    columns::{CLOSE, LOG_RETURN, SIMPLE_RETURN},
};
use dynafactor_traits::{Feature, FeatureColumns, FeatureError, FeatureKind};

use crate::series::{input, lagged, positive};

/// Close-to-close returns against the previous row of the same asset.
///
/// Non-positive closes are treated as missing, so any row touching one has
/// missing returns. The first row of every asset is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceReturns;

impl Feature for PriceReturns {
    fn name(&self) -> &str {
        "price_returns"
    }

    fn kind(&self) -> FeatureKind {
        FeatureKind::Return
    }

    fn required_columns(&self) -> Vec<String> {
        vec![CLOSE.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![LOG_RETURN.to_string(), SIMPLE_RETURN.to_string()]
    }

    fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
        let close = positive(input(frame, CLOSE)?);
        let prev = lagged(&close, 1);

        let log_return = close.mapv(f64::ln) - prev.mapv(f64::ln);
        let simple_return = &close / &prev - 1.0;

        Ok(vec![(LOG_RETURN.to_string(), log_return), (SIMPLE_RETURN.to_string(), simple_return)])
    }
}
