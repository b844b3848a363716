//! Static zero-intercept factor regression.
//!
//! Each asset gets its own time-constant loadings `b_i` from
//! `r_{i,t} = b_i' f_t + e_{i,t}`; the fit is summarised by one pooled R²
//! over every fitted row.

use std::collections::BTreeMap;

use dynafactor_math::{least_squares, total_r_squared};
use dynafactor_primitives::{
    FactorName, FactorTable, Symbol, epoch_days,
    columns::{ASSET_EXCESS_RETURN, DATE, SYMBOL},
};
use dynafactor_traits::{EstimatorError, PanelEstimator};
use dynafactor_utils::date_column;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::align::{SortedPanel, all_finite, default_factor_names, select_factors};
use crate::error::{from_math, from_utils};

/// Realised return column of [`StaticFit::fitted`].
pub const RET: &str = "ret";
/// Fitted return column of [`StaticFit::fitted`].
pub const RET_HAT: &str = "ret_hat";

/// Configuration of a static regression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Regressors, in coefficient order.
    pub factors: Vec<FactorName>,
    /// Dependent return column.
    pub return_column: String,
    /// Assets with fewer aligned rows are left out.
    pub min_obs: usize,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            factors: default_factor_names(),
            return_column: ASSET_EXCESS_RETURN.to_string(),
            min_obs: 0,
        }
    }
}

/// Result of a static regression.
#[derive(Debug, Clone)]
pub struct StaticFit {
    /// Regressors, in coefficient order.
    pub factors: Vec<FactorName>,
    /// Pooled uncentred R².
    pub r_squared: f64,
    /// Loadings per fitted asset.
    pub betas: BTreeMap<Symbol, Array1<f64>>,
    /// Fitted rows: | symbol | date | ret | ret_hat |.
    pub fitted: DataFrame,
    /// Number of fitted assets.
    pub n_assets: usize,
    /// Number of fitted rows.
    pub n_obs: usize,
}

impl StaticFit {
    /// Loadings as a frame: | symbol | factor... |.
    ///
    /// # Errors
    /// Fails only if polars rejects the frame.
    pub fn beta_frame(&self) -> Result<DataFrame, PolarsError> {
        let mut columns = Vec::with_capacity(self.factors.len() + 1);
        columns.push(Column::new(
            SYMBOL.into(),
            self.betas.keys().map(Symbol::as_str).collect::<Vec<_>>(),
        ));
        for (k, name) in self.factors.iter().enumerate() {
            let values: Vec<f64> = self.betas.values().map(|b| b[k]).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }
        DataFrame::new(columns)
    }
}

/// Static zero-intercept regression of each asset on the factor table.
#[derive(Debug, Clone, Default)]
pub struct StaticFactorModel {
    config: StaticConfig,
}

impl StaticFactorModel {
    /// Create a model with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PanelEstimator for StaticFactorModel {
    type Config = StaticConfig;
    type Fit = StaticFit;

    fn with_config(config: StaticConfig) -> Self {
        Self { config }
    }

    fn config(&self) -> &StaticConfig {
        &self.config
    }

    fn required_columns(&self) -> Vec<String> {
        vec![SYMBOL.to_string(), DATE.to_string(), self.config.return_column.clone()]
    }

    fn fit(&self, panel: &DataFrame, factors: &FactorTable) -> Result<StaticFit, EstimatorError> {
        let table = select_factors(factors, &self.config.factors)?;
        let sorted = SortedPanel::new(panel, &[self.config.return_column.as_str()])?;
        let returns = sorted.column(&self.config.return_column)?;
        let k = table.n_factors();

        let mut betas = BTreeMap::new();
        let mut symbols: Vec<&str> = Vec::new();
        let mut days: Vec<i32> = Vec::new();
        let mut actual: Vec<f64> = Vec::new();
        let mut fitted: Vec<f64> = Vec::new();
        let mut longest = 0;

        for run in &sorted.runs {
            let mut rows = Vec::new();
            let mut design = Vec::new();
            for row in run.range() {
                let Some(date) = sorted.dates[row] else { continue };
                let Some(f) = table.row(date) else { continue };
                if !returns[row].is_finite() || !all_finite(f) {
                    continue;
                }
                rows.push((date, returns[row]));
                design.extend(f.iter().copied());
            }
            longest = longest.max(rows.len());
            if rows.is_empty() || rows.len() < self.config.min_obs {
                continue;
            }

            let y: Array1<f64> = rows.iter().map(|(_, r)| *r).collect();
            let x = Array2::from_shape_vec((rows.len(), k), design)
                .map_err(|e| EstimatorError::LinearAlgebra(e.to_string()))?;
            let solved = least_squares(&y, &x).map_err(from_math)?;
            if solved.rank < k {
                tracing::debug!(symbol = %run.symbol, rank = solved.rank, "rank-deficient asset design");
            }

            for ((date, r), e) in rows.iter().zip(&solved.residuals) {
                symbols.push(run.symbol.as_str());
                days.push(epoch_days(*date));
                actual.push(*r);
                fitted.push(r - e);
            }
            betas.insert(run.symbol.clone(), solved.coefficients);
        }

        if betas.is_empty() {
            if longest > 0 {
                return Err(EstimatorError::InsufficientData {
                    required: self.config.min_obs,
                    actual: longest,
                });
            }
            return Err(EstimatorError::EmptyPanel(format!(
                "no aligned observations of {}",
                self.config.return_column
            )));
        }

        let r_squared =
            total_r_squared(Array1::from(actual.clone()).view(), Array1::from(fitted.clone()).view());
        let n_obs = actual.len();
        let frame = DataFrame::new(vec![
            Column::new(SYMBOL.into(), symbols),
            date_column(DATE, &days).map_err(from_utils)?,
            Column::new(RET.into(), actual),
            Column::new(RET_HAT.into(), fitted),
        ])?;

        tracing::info!(
            factors = k,
            assets = betas.len(),
            rows = n_obs,
            r_squared,
            "static regression fitted"
        );

        Ok(StaticFit {
            factors: table.names().to_vec(),
            r_squared,
            n_assets: betas.len(),
            betas,
            fitted: frame,
            n_obs,
        })
    }
}

/// Outcome of one nested specification.
#[derive(Debug)]
pub struct NestedFit {
    /// Specification label, `FF1` to `FFK`.
    pub name: String,
    /// Factors of this specification.
    pub factors: Vec<FactorName>,
    /// The fit, or why it failed.
    pub outcome: Result<StaticFit, EstimatorError>,
}

/// Nested specifications `FFk` built from the first `k` factors, `k = 1..=K`.
#[must_use]
pub fn nested_specs(factors: &[FactorName]) -> Vec<(String, Vec<FactorName>)> {
    (1..=factors.len()).map(|k| (format!("FF{k}"), factors[..k].to_vec())).collect()
}

/// Fit every nested specification of `base.factors`.
///
/// All specifications share one sample: the dates where every factor of
/// `base` that the table holds is present. A failing specification is
/// logged and reported in its [`NestedFit`]; the others are still fitted.
#[must_use]
pub fn run_nested(panel: &DataFrame, factors: &FactorTable, base: &StaticConfig) -> Vec<NestedFit> {
    let held: Vec<FactorName> =
        base.factors.iter().filter(|f| factors.position(f).is_some()).cloned().collect();
    let common = factors.select(&held).map_or_else(|_| factors.clone(), |t| t.complete());
    tracing::debug!(dates = common.len(), of = factors.len(), "common sample for nested specifications");

    nested_specs(&base.factors)
        .into_iter()
        .map(|(name, subset)| {
            let model = StaticFactorModel::with_config(StaticConfig {
                factors: subset.clone(),
                ..base.clone()
            });
            let outcome = model.fit(panel, &common);
            if let Err(err) = &outcome {
                tracing::warn!(spec = %name, error = %err, "static specification failed");
            }
            NestedFit { name, factors: subset, outcome }
        })
        .collect()
}
