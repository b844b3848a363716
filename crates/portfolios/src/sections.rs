//! Date-grouped view of a sorted panel.

use dynafactor_primitives::{Date, date_from_epoch_days};
use dynafactor_utils::{
    AssetRun, UtilsError, asset_runs, epoch_day_values, float_values, require_columns, sort_panel,
};
use ndarray::Array1;
use polars::prelude::DataFrame;

use crate::PortfolioError;

/// A panel sorted by `(symbol, date)` with the row indices of every date's
/// cross-section.
#[derive(Debug, Clone)]
pub struct CrossSections {
    sorted: DataFrame,
    runs: Vec<AssetRun>,
    dates: Vec<Date>,
    rows: Vec<Vec<usize>>,
}

impl CrossSections {
    /// Sort the panel and index its cross-sections.
    ///
    /// # Errors
    /// Fails on an empty panel, missing key columns or null keys.
    pub fn new(panel: &DataFrame) -> Result<Self, PortfolioError> {
        if panel.height() == 0 {
            return Err(UtilsError::EmptyPanel.into());
        }
        let sorted = sort_panel(panel)?;
        let runs = asset_runs(&sorted)?;
        let days = epoch_day_values(&sorted)?;

        let mut distinct = days.clone();
        distinct.sort_unstable();
        distinct.dedup();

        let mut rows = vec![Vec::new(); distinct.len()];
        for (row, day) in days.iter().enumerate() {
            if let Ok(slot) = distinct.binary_search(day) {
                rows[slot].push(row);
            }
        }

        let dates = distinct.into_iter().filter_map(date_from_epoch_days).collect();
        Ok(Self { sorted, runs, dates, rows })
    }

    /// The sorted panel.
    #[must_use]
    pub const fn panel(&self) -> &DataFrame {
        &self.sorted
    }

    /// Distinct dates in ascending order.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Row indices of each date's cross-section, aligned with [`Self::dates`].
    #[must_use]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.rows
    }

    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.runs.len()
    }

    /// Fail unless every named column is present.
    ///
    /// # Errors
    /// Returns the full list of absent columns.
    pub fn require<S: AsRef<str>>(&self, columns: &[S]) -> Result<(), PortfolioError> {
        Ok(require_columns(&self.sorted, columns)?)
    }

    /// Column values in sorted row order, missing as `NaN`.
    ///
    /// # Errors
    /// Fails if the column is absent or not numeric.
    pub fn column(&self, name: &str) -> Result<Array1<f64>, PortfolioError> {
        Ok(float_values(&self.sorted, name)?)
    }

    /// Column shifted down by `lag` rows within each asset.
    ///
    /// # Errors
    /// Fails if the column is absent or not numeric.
    pub fn lagged(&self, name: &str, lag: usize) -> Result<Array1<f64>, PortfolioError> {
        let values = self.column(name)?;
        let mut out = Array1::from_elem(values.len(), f64::NAN);
        for run in &self.runs {
            for row in run.offset + lag..run.offset + run.len {
                out[row] = values[row - lag];
            }
        }
        Ok(out)
    }
}
