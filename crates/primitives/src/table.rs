//! Date-indexed table of factor returns.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::{Date, FactorName, FactorSeries};

/// Factor returns keyed by date, one column per factor.
///
/// Rows are sorted by date; a missing factor value is `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    dates: Vec<Date>,
    names: Vec<FactorName>,
    values: Array2<f64>,
}

impl FactorTable {
    /// Build a table from parts.
    ///
    /// Returns `None` if the shape of `values` does not match `dates` x `names`
    /// or the dates are not strictly increasing.
    #[must_use]
    pub fn new(dates: Vec<Date>, names: Vec<FactorName>, values: Array2<f64>) -> Option<Self> {
        if values.nrows() != dates.len() || values.ncols() != names.len() {
            return None;
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }
        Some(Self { dates, names, values })
    }

    /// Align several series on the union of their dates.
    #[must_use]
    pub fn from_series(series: &[FactorSeries]) -> Self {
        let mut dates: Vec<Date> =
            series.iter().flat_map(|s| s.dates.iter().copied()).collect();
        dates.sort_unstable();
        dates.dedup();

        let mut values = Array2::from_elem((dates.len(), series.len()), f64::NAN);
        for (k, s) in series.iter().enumerate() {
            for (date, value) in s.dates.iter().zip(&s.values) {
                if let Ok(row) = dates.binary_search(date) {
                    values[[row, k]] = *value;
                }
            }
        }

        Self { dates, names: series.iter().map(|s| s.name.clone()).collect(), values }
    }

    /// Dates in ascending order.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Factor names in column order.
    #[must_use]
    pub fn names(&self) -> &[FactorName] {
        &self.names
    }

    /// Raw values, `dates x factors`.
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Number of factors.
    #[must_use]
    pub fn n_factors(&self) -> usize {
        self.names.len()
    }

    /// Column position of a factor.
    #[must_use]
    pub fn position(&self, name: &FactorName) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Values of a single factor.
    #[must_use]
    pub fn column(&self, name: &FactorName) -> Option<ArrayView1<'_, f64>> {
        self.position(name).map(|k| self.values.column(k))
    }

    /// Factor values on a given date, in column order.
    #[must_use]
    pub fn row(&self, date: Date) -> Option<ArrayView1<'_, f64>> {
        self.dates.binary_search(&date).ok().map(|i| self.values.row(i))
    }

    /// Restrict to the named factors, in the order given.
    ///
    /// Returns the names that are not present as the error.
    pub fn select(&self, names: &[FactorName]) -> Result<Self, Vec<FactorName>> {
        let mut positions = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.position(name) {
                Some(k) => positions.push(k),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(Self {
            dates: self.dates.clone(),
            names: names.to_vec(),
            values: self.values.select(Axis(1), &positions),
        })
    }

    /// Keep only the dates on which every factor has a finite value.
    #[must_use]
    pub fn complete(&self) -> Self {
        let keep: Vec<usize> = self
            .values
            .outer_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
            .map(|(i, _)| i)
            .collect();

        Self {
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            names: self.names.clone(),
            values: self.values.select(Axis(0), &keep),
        }
    }

    /// Extract a factor as a standalone series.
    #[must_use]
    pub fn series(&self, name: &FactorName) -> Option<FactorSeries> {
        self.column(name).map(|values| {
            FactorSeries::new(name.clone(), self.dates.clone(), values.to_vec())
        })
    }

    /// Mean of each factor over its finite values.
    #[must_use]
    pub fn means(&self) -> Array1<f64> {
        self.values
            .axis_iter(Axis(1))
            .map(|col| {
                let (sum, n) = col
                    .iter()
                    .filter(|v| v.is_finite())
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n == 0 { f64::NAN } else { sum / n as f64 }
            })
            .collect()
    }
}
