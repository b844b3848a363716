//! Characteristic-instrumented factor regression.
//!
//! Loadings are linear in lagged characteristics, `beta_{i,t} = Γ z_{i,t}`,
//! so `r_{i,t+1} = z_{i,t}' Γ' f_{t+1} + e`. Stacking `f_{t+1} ⊗ z_{i,t}` over
//! every asset and date turns the estimation of Γ into one pooled
//! zero-intercept least-squares problem.

use dynafactor_math::{NormalEquations, kronecker_row, total_r_squared};
use dynafactor_primitives::{
    Date, FactorName, FactorTable, LoadingMatrix, epoch_days,
    columns::{ASSET_EXCESS_RETURN, DATE, MARKET_CAP, SYMBOL, VOLUME},
};
use dynafactor_traits::{EstimatorError, PanelEstimator};
use dynafactor_utils::{date_column, to_float_column};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::align::{SortedPanel, all_finite, default_factor_names, select_factors};
use crate::error::{from_math, from_utils};

/// Next-row return column of [`DynamicFit::panel`].
pub const RET_FWD: &str = "ret_fwd";
/// Fitted return column of [`DynamicFit::panel`].
pub const RET_HAT_DYN: &str = "ret_hat_dyn";

/// Configuration of the dynamic regression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicConfig {
    /// Factors whose next-date returns are explained, `K` of them.
    pub factors: Vec<FactorName>,
    /// Instrumenting characteristics, `L` of them.
    pub characteristics: Vec<String>,
    /// Return column shifted forward one row per asset.
    pub return_column: String,
    /// Assets with fewer usable rows are dropped.
    pub min_obs_asset: usize,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            factors: default_factor_names(),
            characteristics: [MARKET_CAP, "mom_21", "rev", "rvol_yz_30", "illiq", VOLUME]
                .into_iter()
                .map(String::from)
                .collect(),
            return_column: ASSET_EXCESS_RETURN.to_string(),
            min_obs_asset: 20,
        }
    }
}

/// Result of the dynamic regression.
#[derive(Debug, Clone)]
pub struct DynamicFit {
    /// Estimated `K x L` loading map.
    pub gamma: LoadingMatrix,
    /// Pooled uncentred R².
    pub r_squared: f64,
    /// Modelling rows: | symbol | date | ret_fwd | z... | f_{t+1}... |
    /// beta_{factor}... | ret_hat_dyn |.
    pub panel: DataFrame,
    /// Assets in the modelling panel.
    pub n_assets: usize,
    /// Rows in the modelling panel.
    pub n_obs: usize,
}

/// One modelling row: panel row `t` paired with factor-table row `t + 1`.
#[derive(Debug, Clone, Copy)]
struct Observation {
    asset: usize,
    row: usize,
    date: Date,
    factor_row: usize,
    ret_fwd: f64,
}

/// Pooled regression with characteristic-driven loadings.
#[derive(Debug, Clone, Default)]
pub struct DynamicFactorModel {
    config: DynamicConfig,
}

impl DynamicFactorModel {
    /// Create a model with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows with a forward return, a complete `z_t` and a complete `f_{t+1}`,
    /// restricted to assets with at least `min_obs_asset` of them.
    fn observations(
        &self,
        sorted: &SortedPanel,
        z: &Array2<f64>,
        table: &FactorTable,
    ) -> Result<(Vec<Observation>, usize), EstimatorError> {
        let returns = sorted.column(&self.config.return_column)?;
        let mut kept = Vec::new();
        let mut n_assets = 0;
        let mut longest = 0;

        for (asset, run) in sorted.runs.iter().enumerate() {
            let rows: Vec<Observation> = run
                .range()
                .filter(|&row| row + 1 < run.offset + run.len)
                .filter_map(|row| {
                    let date = sorted.dates[row]?;
                    let current = table.dates().binary_search(&date).ok()?;
                    let factor_row = current + 1;
                    let ret_fwd = returns[row + 1];
                    (factor_row < table.len()
                        && ret_fwd.is_finite()
                        && all_finite(z.row(row)))
                    .then_some(Observation { asset, row, date, factor_row, ret_fwd })
                })
                .collect();

            longest = longest.max(rows.len());
            if rows.is_empty() || rows.len() < self.config.min_obs_asset {
                tracing::debug!(symbol = %run.symbol, rows = rows.len(), "asset dropped from dynamic panel");
                continue;
            }
            n_assets += 1;
            kept.extend(rows);
        }

        if kept.is_empty() && longest > 0 {
            return Err(EstimatorError::InsufficientData {
                required: self.config.min_obs_asset,
                actual: longest,
            });
        }
        Ok((kept, n_assets))
    }

    fn output_panel(
        &self,
        sorted: &SortedPanel,
        z: &Array2<f64>,
        table: &FactorTable,
        observations: &[Observation],
        betas: &Array2<f64>,
        fitted: &Array1<f64>,
    ) -> Result<DataFrame, EstimatorError> {
        let rows: Vec<usize> = observations.iter().map(|o| o.row).collect();
        let factor_rows: Vec<usize> = observations.iter().map(|o| o.factor_row).collect();

        let symbols: Vec<&str> =
            observations.iter().map(|o| sorted.runs[o.asset].symbol.as_str()).collect();
        let days: Vec<i32> = observations.iter().map(|o| epoch_days(o.date)).collect();
        let ret_fwd: Vec<f64> = observations.iter().map(|o| o.ret_fwd).collect();

        let mut columns = vec![
            Column::new(SYMBOL.into(), symbols),
            date_column(DATE, &days).map_err(from_utils)?,
            to_float_column(RET_FWD, &ret_fwd),
        ];
        let z = z.select(Axis(0), &rows);
        for (name, values) in self.config.characteristics.iter().zip(z.axis_iter(Axis(1))) {
            columns.push(to_float_column(name, &values.to_vec()));
        }
        let f = table.values().select(Axis(0), &factor_rows);
        for (name, values) in table.names().iter().zip(f.axis_iter(Axis(1))) {
            columns.push(to_float_column(name.as_str(), &values.to_vec()));
        }
        for (name, values) in table.names().iter().zip(betas.axis_iter(Axis(1))) {
            columns.push(to_float_column(&format!("beta_{name}"), &values.to_vec()));
        }
        columns.push(to_float_column(RET_HAT_DYN, &fitted.to_vec()));

        Ok(DataFrame::new(columns)?)
    }
}

impl PanelEstimator for DynamicFactorModel {
    type Config = DynamicConfig;
    type Fit = DynamicFit;

    fn with_config(config: DynamicConfig) -> Self {
        Self { config }
    }

    fn config(&self) -> &DynamicConfig {
        &self.config
    }

    fn required_columns(&self) -> Vec<String> {
        let mut columns =
            vec![SYMBOL.to_string(), DATE.to_string(), self.config.return_column.clone()];
        columns.extend(self.config.characteristics.iter().cloned());
        columns
    }

    fn fit(&self, panel: &DataFrame, factors: &FactorTable) -> Result<DynamicFit, EstimatorError> {
        if self.config.characteristics.is_empty() {
            return Err(EstimatorError::InvalidConfig("no characteristics selected".to_string()));
        }
        let table = select_factors(factors, &self.config.factors)?.complete();

        let mut inputs = vec![self.config.return_column.clone()];
        inputs.extend(self.config.characteristics.iter().cloned());
        let sorted = SortedPanel::new(panel, &inputs)?;
        let z = sorted.matrix(&self.config.characteristics)?;

        let (observations, n_assets) = self.observations(&sorted, &z, &table)?;
        if observations.is_empty() {
            return Err(EstimatorError::EmptyPanel(
                "no row has a forward return, characteristics and next-date factors".to_string(),
            ));
        }

        let (k, l) = (table.n_factors(), self.config.characteristics.len());
        let mut normal = NormalEquations::new(k * l);
        for obs in &observations {
            let design = kronecker_row(table.values().row(obs.factor_row), z.row(obs.row));
            normal.push(design.view(), obs.ret_fwd).map_err(from_math)?;
        }
        let solution = normal.solve().map_err(from_math)?;
        if solution.rank < k * l {
            tracing::warn!(rank = solution.rank, parameters = k * l, "rank-deficient Kronecker design");
        }
        let gamma = solution
            .coefficients
            .into_shape_with_order((k, l))
            .map_err(|e| EstimatorError::LinearAlgebra(e.to_string()))?;

        let mut betas = Array2::zeros((observations.len(), k));
        let mut fitted = Array1::zeros(observations.len());
        for (n, obs) in observations.iter().enumerate() {
            let beta = gamma.dot(&z.row(obs.row));
            fitted[n] = beta.dot(&table.values().row(obs.factor_row));
            betas.row_mut(n).assign(&beta);
        }
        let actual: Array1<f64> = observations.iter().map(|o| o.ret_fwd).collect();
        let r_squared = total_r_squared(actual.view(), fitted.view());

        let out = self.output_panel(&sorted, &z, &table, &observations, &betas, &fitted)?;
        let gamma = LoadingMatrix::new(table.names().to_vec(), self.config.characteristics.clone(), gamma)
            .ok_or_else(|| EstimatorError::DimensionMismatch {
                expected: k * l,
                actual: solution.rank,
                context: "loading matrix".to_string(),
            })?;

        tracing::info!(
            factors = k,
            characteristics = l,
            assets = n_assets,
            rows = observations.len(),
            r_squared,
            "dynamic regression fitted"
        );

        Ok(DynamicFit { gamma, r_squared, panel: out, n_assets, n_obs: observations.len() })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use dynafactor_primitives::date_from_epoch_days;
    use ndarray::array;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use dynafactor_primitives::Symbol;
    use dynafactor_utils::float_values;
    use rand_distr::StandardNormal;

    use super::*;
    use crate::{StaticConfig, StaticFactorModel};

    const START: i32 = 19_723;

    fn factor_table(n: usize, rng: &mut StdRng) -> FactorTable {
        let dates = (0..n).map(|t| date_from_epoch_days(START + t as i32).unwrap()).collect();
        let values = Array2::from_shape_fn((n, 2), |_| rng.sample::<f64, _>(StandardNormal) / 50.0);
        FactorTable::new(dates, vec![FactorName::new("MKT"), FactorName::new("SIZE")], values)
            .unwrap()
    }

    /// Panel whose next-row return is exactly `(Γ z_t)' f_{t+1}`.
    fn panel(table: &FactorTable, gamma: &Array2<f64>, assets: usize, rng: &mut StdRng) -> DataFrame {
        let mut symbol = Vec::new();
        let mut date = Vec::new();
        let mut ret = Vec::new();
        let mut size = Vec::new();
        let mut mom = Vec::new();

        for i in 0..assets {
            let mut previous: Option<Array1<f64>> = None;
            for (t, d) in table.dates().iter().enumerate() {
                let z = array![rng.gen_range(0.5..2.0), rng.sample::<f64, _>(StandardNormal)];
                let r = previous.as_ref().map_or(0.0, |zp| gamma.dot(zp).dot(&table.values().row(t)));
                symbol.push(format!("A{i:02}"));
                date.push(epoch_days(*d));
                ret.push(r);
                size.push(z[0]);
                mom.push(z[1]);
                previous = Some(z);
            }
        }

        df! {
            "symbol" => symbol,
            "date" => date,
            "asset_excess_return" => ret,
            "size" => size,
            "mom" => mom,
        }
        .unwrap()
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()
        .unwrap()
    }

    fn config(min_obs_asset: usize) -> DynamicConfig {
        DynamicConfig {
            factors: vec![FactorName::new("MKT"), FactorName::new("SIZE")],
            characteristics: vec!["size".to_string(), "mom".to_string()],
            min_obs_asset,
            ..DynamicConfig::default()
        }
    }

    #[test]
    fn known_gamma_is_recovered() {
        let mut rng = StdRng::seed_from_u64(11);
        let gamma = array![[1.0, 0.3], [-0.5, 0.8]];
        let table = factor_table(80, &mut rng);
        let panel = panel(&table, &gamma, 12, &mut rng);

        let fit = DynamicFactorModel::with_config(config(20)).fit(&panel, &table).unwrap();

        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-8);
        for ((k, l), expected) in gamma.indexed_iter() {
            assert_relative_eq!(fit.gamma.gamma()[[k, l]], *expected, epsilon = 1e-6);
        }
        assert_eq!(fit.n_assets, 12);
        // the last row of each asset has no forward return
        assert_eq!(fit.n_obs, 12 * 79);
        let names: Vec<&str> = fit.panel.get_column_names().iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            [
                "symbol", "date", "ret_fwd", "size", "mom", "MKT", "SIZE", "beta_MKT",
                "beta_SIZE", "ret_hat_dyn"
            ]
        );
    }

    #[test]
    fn incomplete_factor_dates_are_skipped() {
        let mut rng = StdRng::seed_from_u64(3);
        let gamma = array![[1.0, 0.0], [0.0, 1.0]];
        let mut table = factor_table(40, &mut rng);
        let mut values = table.values().clone();
        values[[10, 1]] = f64::NAN;
        table = FactorTable::new(table.dates().to_vec(), table.names().to_vec(), values).unwrap();
        let panel = panel(&table, &gamma, 3, &mut rng);

        let fit = DynamicFactorModel::with_config(config(1)).fit(&panel, &table).unwrap();
        // date 10 leaves the factor table, its missing return drops date 9,
        // and date 39 has no next date
        assert_eq!(fit.n_obs, 3 * 37);
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-8);
    }

    /// Panel with one fixed characteristic vector per asset, so each asset's
    /// return on every row is `(Γ z_i)' f_t`.
    fn constant_panel(table: &FactorTable, gamma: &Array2<f64>, zs: &[[f64; 2]]) -> DataFrame {
        let mut symbol = Vec::new();
        let mut date = Vec::new();
        let mut ret = Vec::new();
        let mut size = Vec::new();
        let mut mom = Vec::new();
        for (i, z) in zs.iter().enumerate() {
            let beta = gamma.dot(&array![z[0], z[1]]);
            for (t, d) in table.dates().iter().enumerate() {
                symbol.push(format!("A{i:02}"));
                date.push(epoch_days(*d));
                ret.push(beta.dot(&table.values().row(t)));
                size.push(z[0]);
                mom.push(z[1]);
            }
        }
        df! {
            "symbol" => symbol,
            "date" => date,
            "asset_excess_return" => ret,
            "size" => size,
            "mom" => mom,
        }
        .unwrap()
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()
        .unwrap()
    }

    #[test]
    fn constant_characteristics_give_fixed_asset_betas() {
        let mut rng = StdRng::seed_from_u64(17);
        let gamma = array![[0.9, -0.2], [0.4, 1.1]];
        let zs = [[1.0, 0.5], [1.5, -0.8], [0.6, 1.2], [2.0, 0.1]];
        let table = factor_table(60, &mut rng);
        let panel = constant_panel(&table, &gamma, &zs);

        let fit = DynamicFactorModel::with_config(config(10)).fit(&panel, &table).unwrap();
        assert_relative_eq!(fit.r_squared, 1.0, epsilon = 1e-8);

        let symbols: Vec<&str> =
            fit.panel.column(SYMBOL).unwrap().str().unwrap().into_no_null_iter().collect();
        let beta_mkt = float_values(&fit.panel, "beta_MKT").unwrap();
        let beta_size = float_values(&fit.panel, "beta_SIZE").unwrap();
        for (i, z) in zs.iter().enumerate() {
            let expected = gamma.dot(&array![z[0], z[1]]);
            let name = format!("A{i:02}");
            let rows: Vec<usize> = (0..symbols.len()).filter(|&n| symbols[n] == name).collect();
            assert_eq!(rows.len(), 59);
            for n in rows {
                assert_relative_eq!(beta_mkt[n], expected[0], epsilon = 1e-6);
                assert_relative_eq!(beta_size[n], expected[1], epsilon = 1e-6);
            }
        }

        // the per-asset static regression finds the same loadings
        let static_fit = StaticFactorModel::with_config(StaticConfig {
            factors: vec![FactorName::new("MKT"), FactorName::new("SIZE")],
            ..StaticConfig::default()
        })
        .fit(&panel, &table)
        .unwrap();
        for (i, z) in zs.iter().enumerate() {
            let expected = gamma.dot(&array![z[0], z[1]]);
            let betas = &static_fit.betas[&Symbol::new(format!("A{i:02}"))];
            assert_relative_eq!(betas[0], expected[0], epsilon = 1e-8);
            assert_relative_eq!(betas[1], expected[1], epsilon = 1e-8);
        }
    }

    #[test]
    fn thin_assets_are_dropped() {
        let mut rng = StdRng::seed_from_u64(5);
        let gamma = array![[1.0, 0.0], [0.0, 1.0]];
        let table = factor_table(15, &mut rng);
        let panel = panel(&table, &gamma, 4, &mut rng);

        let err = DynamicFactorModel::with_config(config(20)).fit(&panel, &table).unwrap_err();
        // 15 dates leave 14 forward returns per asset
        assert!(matches!(err, EstimatorError::InsufficientData { required: 20, actual: 14 }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn missing_characteristics_everywhere_is_an_empty_panel() {
        let mut rng = StdRng::seed_from_u64(8);
        let table = factor_table(30, &mut rng);
        let mut panel = constant_panel(&table, &array![[1.0, 0.0], [0.0, 1.0]], &[[1.0, 0.5], [0.7, 0.2]]);
        panel.with_column(Column::new("mom".into(), vec![f64::NAN; 60])).unwrap();

        let err = DynamicFactorModel::with_config(config(1)).fit(&panel, &table).unwrap_err();
        assert!(matches!(err, EstimatorError::EmptyPanel(_)));
    }

    #[test]
    fn missing_characteristic_columns_are_listed() {
        let mut rng = StdRng::seed_from_u64(5);
        let table = factor_table(5, &mut rng);
        let panel = panel(&table, &array![[1.0, 0.0], [0.0, 1.0]], 1, &mut rng);
        let model = DynamicFactorModel::with_config(DynamicConfig {
            characteristics: vec!["size".to_string(), "illiq".to_string(), "rev".to_string()],
            ..config(1)
        });
        let err = model.fit(&panel, &table).unwrap_err();
        assert!(matches!(err, EstimatorError::MissingColumns(c) if c == ["illiq", "rev"]));
    }

    #[test]
    fn default_characteristics() {
        let config = DynamicConfig::default();
        assert_eq!(config.factors.len(), 6);
        assert_eq!(config.characteristics.len(), 6);
        assert_eq!(config.min_obs_asset, 20);
    }
}
