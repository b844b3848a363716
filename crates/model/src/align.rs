//! Panel access shared by the regressions.

use dynafactor_primitives::{
    Date, FactorName, FactorTable, date_from_epoch_days,
    columns::{DATE, SYMBOL},
};
use dynafactor_traits::EstimatorError;
use dynafactor_utils::{
    AssetRun, asset_runs, epoch_day_values, float_values, require_columns, sort_panel,
};
use ndarray::{Array1, Array2, ArrayView1};
use polars::prelude::DataFrame;

use crate::error::from_utils;

/// A `(symbol, date)`-sorted panel with its asset runs and row dates.
#[derive(Debug)]
pub(crate) struct SortedPanel {
    pub(crate) frame: DataFrame,
    pub(crate) runs: Vec<AssetRun>,
    pub(crate) dates: Vec<Option<Date>>,
}

impl SortedPanel {
    pub(crate) fn new<S: AsRef<str>>(panel: &DataFrame, columns: &[S]) -> Result<Self, EstimatorError> {
        let mut required: Vec<&str> = vec![SYMBOL, DATE];
        required.extend(columns.iter().map(AsRef::as_ref));
        require_columns(panel, &required).map_err(from_utils)?;

        let frame = sort_panel(panel).map_err(from_utils)?;
        let runs = asset_runs(&frame).map_err(from_utils)?;
        let dates = epoch_day_values(&frame).map_err(from_utils)?.into_iter().map(date_from_epoch_days).collect();
        Ok(Self { frame, runs, dates })
    }

    pub(crate) fn column(&self, name: &str) -> Result<Array1<f64>, EstimatorError> {
        float_values(&self.frame, name).map_err(from_utils)
    }

    /// Columns stacked as `rows x names`.
    pub(crate) fn matrix(&self, names: &[String]) -> Result<Array2<f64>, EstimatorError> {
        let mut out = Array2::from_elem((self.frame.height(), names.len()), f64::NAN);
        for (j, name) in names.iter().enumerate() {
            out.column_mut(j).assign(&self.column(name)?);
        }
        Ok(out)
    }
}

/// Restrict the factor table to `names`, failing with every unknown name.
pub(crate) fn select_factors(
    factors: &FactorTable,
    names: &[FactorName],
) -> Result<FactorTable, EstimatorError> {
    if names.is_empty() {
        return Err(EstimatorError::InvalidConfig("no factors selected".to_string()));
    }
    factors.select(names).map_err(|missing| {
        EstimatorError::MissingFactors(missing.iter().map(ToString::to_string).collect())
    })
}

/// Whether every entry of `v` is finite.
pub(crate) fn all_finite(v: ArrayView1<'_, f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Market plus the five long-short factors, in table order.
pub(crate) fn default_factor_names() -> Vec<FactorName> {
    ["MKT", "SIZE", "MOM", "LIQ", "VOL", "REV"].into_iter().map(FactorName::new).collect()
}
