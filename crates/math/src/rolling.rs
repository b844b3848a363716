//! Trailing-window statistics with a minimum-observation rule.
//!
//! A window ending at row `t` covers rows `t-W+1..=t` of one asset. Only
//! finite values count as observations; when fewer than `min_obs` are
//! present the statistic is `NaN`.

use ndarray::{Array1, s};
use serde::{Deserialize, Serialize};

use crate::{MathError, quantile_linear};

/// Trailing window length and minimum number of valid observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RollingWindow {
    /// Number of trailing rows, current row included.
    pub window: usize,
    /// Valid observations required for a defined statistic.
    pub min_obs: usize,
}

impl RollingWindow {
    /// Create a new window.
    #[must_use]
    pub const fn new(window: usize, min_obs: usize) -> Self {
        Self { window, min_obs }
    }

    /// Check `1 <= min_obs <= window`.
    ///
    /// # Errors
    /// Returns [`MathError::InvalidWindow`] otherwise.
    pub const fn validate(&self) -> Result<(), MathError> {
        if self.window == 0 || self.min_obs == 0 || self.min_obs > self.window {
            return Err(MathError::InvalidWindow { window: self.window, min_obs: self.min_obs });
        }
        Ok(())
    }

    /// Apply `stat` to the valid values of every trailing window.
    ///
    /// `stat` receives a scratch buffer it may reorder.
    pub fn apply<F>(&self, data: &Array1<f64>, mut stat: F) -> Array1<f64>
    where
        F: FnMut(&mut [f64]) -> f64,
    {
        let n = data.len();
        let mut out = Array1::from_elem(n, f64::NAN);
        let mut buf = Vec::with_capacity(self.window);

        for t in 0..n {
            let start = (t + 1).saturating_sub(self.window);
            buf.clear();
            buf.extend(data.slice(s![start..=t]).iter().copied().filter(|v| v.is_finite()));
            if buf.len() >= self.min_obs.max(1) {
                out[t] = stat(&mut buf);
            }
        }

        out
    }

    /// Apply `stat` to the rows of every trailing window where both series are valid.
    ///
    /// # Errors
    /// Returns [`MathError::DimensionMismatch`] if the series differ in length.
    pub fn apply_pairs<F>(
        &self,
        x: &Array1<f64>,
        y: &Array1<f64>,
        mut stat: F,
    ) -> Result<Array1<f64>, MathError>
    where
        F: FnMut(&[f64], &[f64]) -> f64,
    {
        if x.len() != y.len() {
            return Err(MathError::DimensionMismatch { expected: x.len(), actual: y.len() });
        }

        let n = x.len();
        let mut out = Array1::from_elem(n, f64::NAN);
        let mut xs = Vec::with_capacity(self.window);
        let mut ys = Vec::with_capacity(self.window);

        for t in 0..n {
            let start = (t + 1).saturating_sub(self.window);
            xs.clear();
            ys.clear();
            for i in start..=t {
                if x[i].is_finite() && y[i].is_finite() {
                    xs.push(x[i]);
                    ys.push(y[i]);
                }
            }
            if xs.len() >= self.min_obs.max(1) {
                out[t] = stat(&xs, &ys);
            }
        }

        Ok(out)
    }

    /// Number of valid observations per window.
    #[must_use]
    pub fn count(&self, data: &Array1<f64>) -> Array1<f64> {
        self.apply(data, |v| v.len() as f64)
    }

    /// Trailing sum.
    #[must_use]
    pub fn sum(&self, data: &Array1<f64>) -> Array1<f64> {
        self.apply(data, |v| v.iter().sum())
    }

    /// Trailing mean.
    #[must_use]
    pub fn mean(&self, data: &Array1<f64>) -> Array1<f64> {
        self.apply(data, |v| v.iter().sum::<f64>() / v.len() as f64)
    }

    /// Trailing sample variance (`n - 1` denominator); `NaN` with a single observation.
    #[must_use]
    pub fn var(&self, data: &Array1<f64>) -> Array1<f64> {
        self.apply(data, |v| sample_variance(v))
    }

    /// Trailing quantile with linear interpolation between order statistics.
    ///
    /// # Errors
    /// Returns [`MathError::InvalidQuantile`] if `q` is outside `[0, 1]`.
    pub fn quantile(&self, data: &Array1<f64>, q: f64) -> Result<Array1<f64>, MathError> {
        if !(0.0..=1.0).contains(&q) {
            return Err(MathError::InvalidQuantile(q));
        }
        Ok(self.apply(data, |v| quantile_linear(v, q)))
    }
}

fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    const NAN: f64 = f64::NAN;

    #[rstest]
    #[case(0, 0)]
    #[case(5, 0)]
    #[case(5, 6)]
    fn invalid_windows(#[case] window: usize, #[case] min_obs: usize) {
        assert!(RollingWindow::new(window, min_obs).validate().is_err());
    }

    #[test]
    fn mean_requires_min_obs() {
        let w = RollingWindow::new(3, 2);
        let out = w.mean(&array![1.0, 2.0, 3.0, 4.0]);
        assert!(out[0].is_nan());
        assert_relative_eq!(out[1], 1.5);
        assert_relative_eq!(out[2], 2.0);
        assert_relative_eq!(out[3], 3.0);
    }

    #[test]
    fn missing_values_count_against_min_obs() {
        let w = RollingWindow::new(3, 2);
        let out = w.sum(&array![1.0, NAN, NAN, 4.0, 5.0]);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        // window {NaN, NaN, 4} has one observation
        assert!(out[3].is_nan());
        assert_relative_eq!(out[4], 9.0);
    }

    #[test]
    fn missing_is_never_zero() {
        let w = RollingWindow::new(2, 1);
        let out = w.sum(&array![NAN, NAN]);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn variance_sample_denominator() {
        let w = RollingWindow::new(4, 2);
        let out = w.var(&array![1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(out[1], 0.5);
        assert_relative_eq!(out[3], 5.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn quantile_interpolates() {
        let w = RollingWindow::new(5, 5);
        let out = w.quantile(&array![5.0, 1.0, 4.0, 2.0, 3.0], 0.05).unwrap();
        // h = 4 * 0.05 = 0.2 -> 1 + 0.2 * (2 - 1)
        assert_relative_eq!(out[4], 1.2, epsilon = 1e-12);
        assert!(w.quantile(&array![1.0], 1.5).is_err());
    }

    #[test]
    fn pairs_skip_rows_with_either_missing() {
        let w = RollingWindow::new(3, 2);
        let x = array![1.0, NAN, 3.0, 4.0];
        let y = array![1.0, 2.0, NAN, 4.0];
        let out = w.apply_pairs(&x, &y, |xs, _| xs.len() as f64).unwrap();
        assert!(out[2].is_nan());
        assert!(out[3].is_nan());

        let out = RollingWindow::new(4, 2).apply_pairs(&x, &y, |xs, _| xs.len() as f64).unwrap();
        assert_relative_eq!(out[3], 2.0);

        assert!(w.apply_pairs(&x, &array![1.0], |_, _| 0.0).is_err());
    }

    #[test]
    fn count_observations() {
        let w = RollingWindow::new(3, 1);
        let out = w.count(&array![1.0, NAN, 2.0, 3.0]);
        assert_eq!(out.to_vec(), vec![1.0, 1.0, 2.0, 2.0]);
    }
}
