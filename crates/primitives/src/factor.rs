//! Factor-related type definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Date, columns};

/// Name of a factor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactorName(pub String);

impl FactorName {
    /// Create a new factor name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the factor name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FactorName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FactorName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which extreme bucket of a quantile sort is held long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongSide {
    /// Long the highest bucket, short the lowest (`Q_top - Q_1`).
    High,
    /// Long the lowest bucket, short the highest (`Q_1 - Q_top`).
    Low,
}

impl LongSide {
    /// Combine the extreme bucket returns into the long-short return.
    #[must_use]
    pub fn spread(self, bottom: f64, top: f64) -> f64 {
        match self {
            Self::High => top - bottom,
            Self::Low => bottom - top,
        }
    }
}

impl std::fmt::Display for LongSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Declarative description of a characteristic-sorted long-short factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorDescriptor {
    /// Output factor name.
    pub name: FactorName,
    /// Characteristic column the cross-section is sorted on.
    pub characteristic: String,
    /// Rows the characteristic is lagged by, per asset, before sorting (at least 1).
    pub lag: usize,
    /// Which extreme is held long.
    pub long_side: LongSide,
    /// Number of quantile buckets.
    pub quantiles: usize,
    /// Column used for value weighting inside a bucket.
    pub weight_column: String,
}

impl FactorDescriptor {
    /// Descriptor with the default lag (1 row), 5 buckets and market-cap weights.
    #[must_use]
    pub fn new(
        name: impl Into<FactorName>,
        characteristic: impl Into<String>,
        long_side: LongSide,
    ) -> Self {
        Self {
            name: name.into(),
            characteristic: characteristic.into(),
            long_side,
            ..Self::default()
        }
    }

    /// Set the number of quantile buckets.
    #[must_use]
    pub const fn with_quantiles(mut self, quantiles: usize) -> Self {
        self.quantiles = quantiles;
        self
    }

    /// Set the characteristic lag.
    #[must_use]
    pub const fn with_lag(mut self, lag: usize) -> Self {
        self.lag = lag;
        self
    }

    /// Set the weight column.
    #[must_use]
    pub fn with_weight_column(mut self, column: impl Into<String>) -> Self {
        self.weight_column = column.into();
        self
    }
}

impl Default for FactorDescriptor {
    fn default() -> Self {
        Self {
            name: FactorName::new(""),
            characteristic: String::new(),
            lag: 1,
            long_side: LongSide::High,
            quantiles: 5,
            weight_column: columns::MARKET_CAP.to_string(),
        }
    }
}

/// A named, date-indexed return series. Missing dates hold `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSeries {
    /// Factor name.
    pub name: FactorName,
    /// Dates in ascending order.
    pub dates: Vec<Date>,
    /// Return on each date.
    pub values: Vec<f64>,
}

impl FactorSeries {
    /// Create a new series. `dates` and `values` must have equal length.
    #[must_use]
    pub fn new(name: impl Into<FactorName>, dates: Vec<Date>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { name: name.into(), dates, values }
    }

    /// Value on `date`, if the date is present (the value may still be `NaN`).
    #[must_use]
    pub fn get(&self, date: Date) -> Option<f64> {
        self.dates.binary_search(&date).ok().map(|i| self.values[i])
    }

    /// Number of dates with a finite value.
    #[must_use]
    pub fn n_valid(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    /// Number of dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(LongSide::High, 0.01, 0.03, 0.02)]
    #[case(LongSide::Low, 0.01, 0.03, -0.02)]
    fn long_side_spread(
        #[case] side: LongSide,
        #[case] bottom: f64,
        #[case] top: f64,
        #[case] expected: f64,
    ) {
        approx::assert_relative_eq!(side.spread(bottom, top), expected, epsilon = 1e-12);
    }

    #[test]
    fn descriptor_defaults() {
        let d = FactorDescriptor::new("SIZE", "market_cap", LongSide::Low);
        assert_eq!(d.lag, 1);
        assert_eq!(d.quantiles, 5);
        assert_eq!(d.weight_column, "market_cap");
        assert_eq!(d.name.as_str(), "SIZE");
    }

    #[test]
    fn series_lookup() {
        let d0 = Date::from_ymd_opt(2024, 1, 1).unwrap();
        let d1 = Date::from_ymd_opt(2024, 1, 2).unwrap();
        let series = FactorSeries::new("MOM", vec![d0, d1], vec![0.5, f64::NAN]);

        assert_eq!(series.get(d0), Some(0.5));
        assert!(series.get(d1).unwrap().is_nan());
        assert_eq!(series.get(Date::from_ymd_opt(2024, 1, 3).unwrap()), None);
        assert_eq!(series.n_valid(), 1);
    }
}
