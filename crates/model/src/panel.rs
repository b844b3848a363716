//! Input panel for instrumented principal components.
//!
//! Rows are keyed by an integer asset id and a dense time index, the target
//! is the next-row return of each asset, and characteristics are median
//! imputed and optionally z-scored within each period.

use dynafactor_math::{MedianImpute, Standardize};
use dynafactor_primitives::{
    Date, Symbol, date_from_epoch_days,
    columns::{ASSET_EXCESS_RETURN, DATE, MARKET_CAP, SYMBOL, VOLUME},
};
use dynafactor_traits::CrossSectionTransform;
use dynafactor_utils::{
    epoch_day_values, float_values, require_columns, sort_panel, symbol_values,
};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Asset id column.
pub const ID: &str = "id";
/// Time index column.
pub const TIME_INDEX: &str = "t";
/// Next-row return column.
pub const TARGET: &str = "y";

/// Integer keys of a `(symbol, date)` panel.
///
/// Asset ids are 1-based positions in the sorted distinct symbols; the time
/// index is the 1-based dense rank of the date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelIndex {
    symbols: Vec<Symbol>,
    dates: Vec<Date>,
}

impl PanelIndex {
    /// Index every symbol and date of `panel`.
    ///
    /// # Errors
    /// Fails on missing or null keys.
    pub fn build(panel: &DataFrame) -> Result<Self, ModelError> {
        require_columns(panel, &[SYMBOL, DATE])?;
        let mut symbols: Vec<Symbol> = symbol_values(panel)?.into_iter().map(Symbol::new).collect();
        symbols.sort_unstable();
        symbols.dedup();

        let mut days = epoch_day_values(panel)?;
        days.sort_unstable();
        days.dedup();
        let dates = days
            .into_iter()
            .map(|d| {
                date_from_epoch_days(d)
                    .ok_or_else(|| ModelError::InvalidConfig(format!("date out of range: {d}")))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { symbols, dates })
    }

    /// Distinct symbols in id order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Distinct dates in time-index order.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Number of periods.
    #[must_use]
    pub fn n_periods(&self) -> usize {
        self.dates.len()
    }

    /// Id of a symbol.
    #[must_use]
    pub fn id(&self, symbol: &str) -> Option<u32> {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
            .and_then(|i| u32::try_from(i + 1).ok())
    }

    /// Time index of a date.
    #[must_use]
    pub fn t(&self, date: Date) -> Option<u32> {
        self.dates.binary_search(&date).ok().and_then(|i| u32::try_from(i + 1).ok())
    }

    /// `panel` with `id` and `t` columns appended, replacing existing ones.
    ///
    /// # Errors
    /// Fails on keys absent from the index.
    pub fn attach(&self, panel: &DataFrame) -> Result<DataFrame, ModelError> {
        let ids = symbol_values(panel)?
            .iter()
            .map(|s| {
                self.id(s).ok_or_else(|| ModelError::InvalidConfig(format!("unindexed symbol {s}")))
            })
            .collect::<Result<Vec<u32>, _>>()?;
        let ts = epoch_day_values(panel)?
            .into_iter()
            .map(|d| {
                date_from_epoch_days(d)
                    .and_then(|date| self.t(date))
                    .ok_or_else(|| ModelError::InvalidConfig(format!("unindexed date {d}")))
            })
            .collect::<Result<Vec<u32>, _>>()?;

        let base = panel.drop_many([ID, TIME_INDEX]);
        Ok(base.hstack(&[Column::new(ID.into(), ids), Column::new(TIME_INDEX.into(), ts)])?)
    }
}

/// Inputs of the instrumented panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcaConfig {
    /// Characteristics, in column order.
    pub characteristics: Vec<String>,
    /// Return column shifted forward one row per asset.
    pub return_column: String,
    /// Z-score characteristics within each period after imputation.
    pub standardize: bool,
}

impl Default for IpcaConfig {
    fn default() -> Self {
        let characteristics = [
            VOLUME,
            MARKET_CAP,
            "rev_log",
            "mom_7",
            "mom_14",
            "mom_21",
            "mom_30",
            "var5_90",
            "es5_90",
            "capm_alpha_30",
            "capm_beta_30",
            "idio_vol_30",
            "rvol_yz_30",
            "illiq",
            "vol_shock_15",
            "vol_shock_30",
            "bid_ask",
        ];
        Self {
            characteristics: characteristics.into_iter().map(String::from).collect(),
            return_column: ASSET_EXCESS_RETURN.to_string(),
            standardize: true,
        }
    }
}

/// A prepared instrumented panel: | id | t | symbol | date | y | z... |.
#[derive(Debug, Clone)]
pub struct IpcaPanel {
    frame: DataFrame,
    index: PanelIndex,
    characteristics: Vec<String>,
}

impl IpcaPanel {
    /// The prepared rows, sorted by `(id, t)`.
    #[must_use]
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Keys of the source panel.
    #[must_use]
    pub const fn index(&self) -> &PanelIndex {
        &self.index
    }

    /// Characteristic columns.
    #[must_use]
    pub fn characteristics(&self) -> &[String] {
        &self.characteristics
    }

    /// Number of rows.
    #[must_use]
    pub fn n_obs(&self) -> usize {
        self.frame.height()
    }

    /// Target vector.
    ///
    /// # Errors
    /// Fails only if the frame was altered.
    pub fn y(&self) -> Result<Array1<f64>, ModelError> {
        Ok(float_values(&self.frame, TARGET)?)
    }

    /// Characteristic matrix, `rows x L`.
    ///
    /// # Errors
    /// Fails only if the frame was altered.
    pub fn x(&self) -> Result<Array2<f64>, ModelError> {
        let mut out = Array2::zeros((self.n_obs(), self.characteristics.len()));
        for (j, name) in self.characteristics.iter().enumerate() {
            out.column_mut(j).assign(&float_values(&self.frame, name)?);
        }
        Ok(out)
    }

    /// Rows per asset relative to the number of periods in the panel:
    /// | id | symbol | obs | obs_rate |, densest assets first.
    ///
    /// # Errors
    /// Fails only if polars rejects the aggregation.
    pub fn observation_rates(&self) -> Result<DataFrame, ModelError> {
        let periods = self.frame.column(TIME_INDEX)?.n_unique()?.max(1);
        Ok(self
            .frame
            .clone()
            .lazy()
            .group_by([col(ID), col(SYMBOL)])
            .agg([len().alias("obs")])
            .with_column((col("obs").cast(DataType::Float64) / lit(periods as f64)).alias("obs_rate"))
            .sort(
                ["obs_rate", ID],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .collect()?)
    }
}

/// Builds an [`IpcaPanel`] from a feature panel.
#[derive(Debug, Clone, Default)]
pub struct IpcaPanelBuilder {
    config: IpcaConfig,
}

impl IpcaPanelBuilder {
    /// Create a builder.
    #[must_use]
    pub const fn new(config: IpcaConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &IpcaConfig {
        &self.config
    }

    /// Key the panel, attach next-row targets, drop rows without one and
    /// clean the characteristics period by period.
    ///
    /// # Errors
    /// Fails on missing columns, an empty panel or an empty characteristic list.
    pub fn build(&self, panel: &DataFrame) -> Result<IpcaPanel, ModelError> {
        let chars = &self.config.characteristics;
        if chars.is_empty() {
            return Err(ModelError::InvalidConfig("no characteristics selected".to_string()));
        }
        let mut required = vec![SYMBOL, DATE, self.config.return_column.as_str()];
        required.extend(chars.iter().map(String::as_str));
        require_columns(panel, &required)?;

        let index = PanelIndex::build(panel)?;
        let keyed = index.attach(&sort_panel(panel)?)?;

        let mut lazy = keyed
            .lazy()
            .with_column(
                col(self.config.return_column.as_str())
                    .cast(DataType::Float64)
                    .shift(lit(-1))
                    .over([col(SYMBOL)])
                    .alias(TARGET),
            )
            .filter(col(TARGET).is_not_null().and(col(TARGET).is_not_nan()))
            .with_columns(
                chars
                    .iter()
                    .map(|c| {
                        let x = col(c.as_str()).cast(DataType::Float64);
                        when(x.clone().is_nan()).then(lit(NULL)).otherwise(x).alias(c.as_str())
                    })
                    .collect::<Vec<_>>(),
            )
            .with_columns(
                chars.iter().map(|c| MedianImpute.transform(c, TIME_INDEX)).collect::<Vec<_>>(),
            );
        if self.config.standardize {
            lazy = lazy.with_columns(
                chars.iter().map(|c| Standardize.transform(c, TIME_INDEX)).collect::<Vec<_>>(),
            );
        }

        let mut columns = vec![col(ID), col(TIME_INDEX), col(SYMBOL), col(DATE), col(TARGET)];
        columns.extend(chars.iter().map(|c| col(c.as_str())));
        let frame = lazy
            .select(columns)
            .sort([ID, TIME_INDEX], SortMultipleOptions::default())
            .collect()?;

        if frame.height() == 0 {
            return Err(ModelError::InvalidConfig(format!(
                "no row has a next-row {}",
                self.config.return_column
            )));
        }

        tracing::info!(
            rows = frame.height(),
            assets = index.n_assets(),
            periods = index.n_periods(),
            characteristics = chars.len(),
            standardized = self.config.standardize,
            "instrumented panel prepared"
        );

        Ok(IpcaPanel { frame, index, characteristics: chars.clone() })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn panel() -> DataFrame {
        df! {
            "symbol" => &["ETH", "BTC", "SOL", "ETH", "BTC", "SOL", "ETH", "BTC"],
            "date" => &[19_724i32, 19_724, 19_724, 19_726, 19_726, 19_726, 19_730, 19_730],
            "asset_excess_return" => &[0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08],
            "size" => &[Some(1.0), Some(3.0), None, Some(2.0), Some(6.0), Some(4.0), Some(1.0), Some(1.0)],
        }
        .unwrap()
        .lazy()
        .with_column(col("date").cast(DataType::Date))
        .collect()
        .unwrap()
    }

    fn config(standardize: bool) -> IpcaConfig {
        IpcaConfig {
            characteristics: vec!["size".to_string()],
            standardize,
            ..IpcaConfig::default()
        }
    }

    fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
        float_values(df, name).unwrap().to_vec()
    }

    #[test]
    fn ids_and_dense_time_index() {
        let index = PanelIndex::build(&panel()).unwrap();
        assert_eq!(index.id("BTC"), Some(1));
        assert_eq!(index.id("SOL"), Some(3));
        assert_eq!(index.id("DOGE"), None);
        assert_eq!(index.n_periods(), 3);
        // calendar gaps do not open gaps in t
        assert_eq!(index.t(date_from_epoch_days(19_730).unwrap()), Some(3));
    }

    #[test]
    fn targets_are_next_row_returns() {
        let prepared = IpcaPanelBuilder::new(config(false)).build(&panel()).unwrap();
        let frame = prepared.frame();

        // SOL's and the last-date rows have no next row
        assert_eq!(prepared.n_obs(), 5);
        let ids: Vec<u32> = frame.column(ID).unwrap().u32().unwrap().into_no_null_iter().collect();
        assert_eq!(ids, [1, 1, 2, 2, 3]);
        assert_eq!(floats(frame, TARGET), [0.05, 0.08, 0.04, 0.07, 0.06]);
    }

    #[test]
    fn missing_characteristics_take_the_period_median() {
        let prepared = IpcaPanelBuilder::new(config(false)).build(&panel()).unwrap();
        // SOL on the first date gets the median of BTC and ETH
        let size = floats(prepared.frame(), "size");
        assert_relative_eq!(size[4], 2.0);
    }

    #[test]
    fn standardized_periods_have_zero_mean() {
        let prepared = IpcaPanelBuilder::new(config(true)).build(&panel()).unwrap();
        let x = prepared.x().unwrap();
        let t: Vec<u32> =
            prepared.frame().column(TIME_INDEX).unwrap().u32().unwrap().into_no_null_iter().collect();

        let first: f64 = t.iter().zip(x.column(0)).filter(|(t, _)| **t == 1).map(|(_, v)| v).sum();
        assert_relative_eq!(first, 0.0, epsilon = 1e-12);
        assert_eq!(prepared.y().unwrap().len(), 5);
    }

    #[test]
    fn observation_rates_densest_first() {
        let prepared = IpcaPanelBuilder::new(config(false)).build(&panel()).unwrap();
        let rates = prepared.observation_rates().unwrap();

        assert_eq!(floats(&rates, "obs"), [2.0, 2.0, 1.0]);
        let rate = floats(&rates, "obs_rate");
        assert_relative_eq!(rate[0], 1.0);
        assert_relative_eq!(rate[2], 0.5);
    }

    #[test]
    fn missing_characteristic_is_reported() {
        let err = IpcaPanelBuilder::default().build(&panel()).unwrap_err();
        assert!(err.to_string().contains("rev_log"));
    }
}
