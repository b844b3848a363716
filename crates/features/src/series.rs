//! Element-wise helpers shared by the feature implementations.

use dynafactor_primitives::AssetFrame;
use dynafactor_traits::FeatureError;
use ndarray::Array1;

/// Borrow an input column of the frame.
pub(crate) fn input<'a>(frame: &'a AssetFrame, name: &str) -> Result<&'a Array1<f64>, FeatureError> {
    frame.column(name).ok_or_else(|| FeatureError::MissingInput(name.to_string()))
}

/// Keep strictly positive values; everything else becomes `NaN`.
pub(crate) fn positive(values: &Array1<f64>) -> Array1<f64> {
    values.mapv(|v| if v > 0.0 { v } else { f64::NAN })
}

/// Shift values down by `lag` rows, padding the head with `NaN`.
pub(crate) fn lagged(values: &Array1<f64>, lag: usize) -> Array1<f64> {
    let n = values.len();
    Array1::from_shape_fn(n, |t| if t >= lag { values[t - lag] } else { f64::NAN })
}

/// Clamp to `[0, 1]`, leaving `NaN` in place.
pub(crate) fn clip_unit(v: f64) -> f64 {
    if v.is_nan() { v } else { v.clamp(0.0, 1.0) }
}
