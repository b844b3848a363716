//! Weight type definitions.

use ndarray::Array1;

/// Market capitalization weights for a portfolio bucket.
///
/// Weights are proportional to the raw caps when every cap is finite and
/// strictly positive and their sum is positive; otherwise the bucket falls
/// back to equal weights.
#[derive(Debug, Clone)]
pub struct MarketCapWeights {
    /// Raw market caps.
    raw: Array1<f64>,
    /// Normalized weights (sum to 1).
    normalized: Array1<f64>,
    value_weighted: bool,
}

impl MarketCapWeights {
    /// Create market cap weights from raw values.
    #[must_use]
    pub fn from_raw(raw: Array1<f64>) -> Self {
        let n = raw.len();
        let total: f64 = raw.sum();
        let usable = raw.iter().all(|&w| w.is_finite() && w > 0.0) && total > 0.0;

        let normalized = if usable {
            &raw / total
        } else if n > 0 {
            Array1::from_elem(n, 1.0 / n as f64)
        } else {
            Array1::zeros(0)
        };

        Self { raw, normalized, value_weighted: usable }
    }

    /// Get the raw market caps.
    #[must_use]
    pub const fn raw(&self) -> &Array1<f64> {
        &self.raw
    }

    /// Get normalized weights (sum to 1).
    #[must_use]
    pub const fn normalized(&self) -> &Array1<f64> {
        &self.normalized
    }

    /// Whether the weights are cap-proportional rather than the equal-weight fallback.
    #[must_use]
    pub const fn is_value_weighted(&self) -> bool {
        self.value_weighted
    }

    /// Weighted mean of `values`; `NaN` when empty or lengths differ.
    #[must_use]
    pub fn weighted_mean(&self, values: &Array1<f64>) -> f64 {
        if self.is_empty() || values.len() != self.len() {
            return f64::NAN;
        }
        self.normalized.dot(values)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    #[test]
    fn market_cap_weights_normalized() {
        let weights = MarketCapWeights::from_raw(array![100.0, 200.0, 300.0, 400.0]);
        assert!(weights.is_value_weighted());
        assert_relative_eq!(weights.normalized().sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(weights.normalized()[3], 0.4, epsilon = 1e-12);
    }

    #[rstest]
    #[case(array![100.0, 0.0, 300.0])]
    #[case(array![100.0, -5.0, 300.0])]
    #[case(array![100.0, f64::NAN, 300.0])]
    fn unusable_caps_fall_back_to_equal(#[case] raw: Array1<f64>) {
        let weights = MarketCapWeights::from_raw(raw);
        assert!(!weights.is_value_weighted());
        let mean = weights.weighted_mean(&array![0.03, 0.06, 0.09]);
        assert_relative_eq!(mean, 0.06, epsilon = 1e-12);
    }

    #[test]
    fn weighted_mean_value_weights() {
        let weights = MarketCapWeights::from_raw(array![1.0, 3.0]);
        assert_relative_eq!(weights.weighted_mean(&array![0.1, 0.2]), 0.175, epsilon = 1e-12);
    }

    #[test]
    fn empty_weights() {
        let weights = MarketCapWeights::from_raw(Array1::zeros(0));
        assert!(weights.is_empty());
        assert!(weights.weighted_mean(&Array1::zeros(0)).is_nan());
    }
}
