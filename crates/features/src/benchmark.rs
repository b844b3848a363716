//! Risk-free alignment, value-weighted market return and excess returns.

use std::collections::BTreeSet;

use dynafactor_primitives::columns::{
    ASSET_EXCESS_RETURN, DATE, MARKET_CAP, MARKET_EXCESS_RETURN, MARKET_RETURN, RISK_FREE_RATE,
    SIMPLE_RETURN, SYMBOL,
};
use dynafactor_utils::{
    date_column, epoch_day_values, fill_features, float_values, require_columns, sort_panel,
    to_float_column,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

const RF_ANNUAL: &str = "_rf_annual";
const CAP_LAG: &str = "_cap_lag";
const CAP_TOTAL: &str = "_cap_total";
const WEIGHT: &str = "_weight";
const CONTRIBUTION: &str = "_contribution";

const OUTPUTS: [&str; 4] = [RISK_FREE_RATE, MARKET_RETURN, ASSET_EXCESS_RETURN, MARKET_EXCESS_RETURN];

/// Layout of the external risk-free series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFreeConfig {
    /// Date column of the rate table.
    pub date_column: String,
    /// Annualised rate column, in percent.
    pub rate_column: String,
    /// Compounding periods per year.
    pub days_per_year: f64,
}

impl Default for RiskFreeConfig {
    fn default() -> Self {
        Self {
            date_column: DATE.to_string(),
            rate_column: "risk_free_annual".to_string(),
            days_per_year: 365.0,
        }
    }
}

/// Convert an annualised percentage rate to a daily compounding rate.
#[must_use]
pub fn daily_risk_free(annual_pct: f64, days_per_year: f64) -> f64 {
    (1.0 + annual_pct / 100.0).powf(1.0 / days_per_year) - 1.0
}

/// Adds `risk_free_rate`, `market_return` and both excess returns to a panel.
///
/// The panel must already hold `simple_return` and `market_cap`. The market
/// return on date `t` weights each asset's simple return by its market cap
/// on its previous row, normalised by the total lagged cap of that date.
/// Dates whose lagged total is not positive, or where no asset contributes,
/// get a missing market return.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkBuilder {
    config: RiskFreeConfig,
}

impl BenchmarkBuilder {
    /// Create a builder for the given rate-table layout.
    #[must_use]
    pub const fn new(config: RiskFreeConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &RiskFreeConfig {
        &self.config
    }

    /// Daily risk-free rate on every distinct panel date.
    ///
    /// The rate series is forward filled over the union of both calendars,
    /// so a panel date without a quote takes the latest earlier quote.
    /// Dates before the first quote stay missing.
    ///
    /// # Errors
    /// Fails if either table lacks its date column or the rate column.
    pub fn align_risk_free(&self, panel: &DataFrame, rates: &DataFrame) -> Result<DataFrame, EngineError> {
        let cfg = &self.config;
        require_columns(rates, &[cfg.date_column.as_str(), cfg.rate_column.as_str()])?;

        let calendar: Vec<i32> = epoch_day_values(panel)?.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let calendar = DataFrame::new(vec![date_column(DATE, &calendar)?])?;

        let rates = rates
            .clone()
            .lazy()
            .select([
                col(cfg.date_column.as_str()).cast(DataType::Date).alias(DATE),
                col(cfg.rate_column.as_str()).cast(DataType::Float64).alias(RF_ANNUAL),
            ])
            .group_by([col(DATE)])
            .agg([col(RF_ANNUAL).last()]);

        let union = calendar.clone().lazy().join(
            rates,
            [col(DATE)],
            [col(DATE)],
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        );
        let filled = calendar
            .lazy()
            .join(fill_features(union, &[RF_ANNUAL], DATE, None), [col(DATE)], [col(DATE)], JoinArgs::new(JoinType::Left))
            .sort([DATE], SortMultipleOptions::default())
            .collect()?;

        let daily: Vec<f64> = float_values(&filled, RF_ANNUAL)?
            .iter()
            .map(|&annual| daily_risk_free(annual, cfg.days_per_year))
            .collect();

        Ok(DataFrame::new(vec![filled.column(DATE)?.clone(), to_float_column(RISK_FREE_RATE, &daily)])?)
    }

    /// Attach the benchmark columns, replacing any previous ones.
    ///
    /// # Errors
    /// Fails if the panel lacks `symbol`, `date`, `simple_return` or
    /// `market_cap`, or the rate table is malformed.
    pub fn build(&self, panel: &DataFrame, rates: &DataFrame) -> Result<DataFrame, EngineError> {
        require_columns(panel, &[SYMBOL, DATE, SIMPLE_RETURN, MARKET_CAP])?;

        let panel = sort_panel(panel)?;
        let kept: Vec<String> = panel
            .get_column_names()
            .into_iter()
            .map(|c| c.to_string())
            .filter(|c| !OUTPUTS.contains(&c.as_str()))
            .collect();
        let panel = panel.select(kept.iter().map(String::as_str))?;

        let daily = self.align_risk_free(&panel, rates)?;

        let mut output: Vec<Expr> = kept.iter().map(|c| col(c.as_str())).collect();
        output.extend(OUTPUTS.iter().map(|&c| col(c)));

        let out = panel
            .lazy()
            .join(daily.lazy(), [col(DATE)], [col(DATE)], JoinArgs::new(JoinType::Left))
            .with_columns([col(MARKET_CAP)
                .cast(DataType::Float64)
                .shift(lit(1))
                .over([col(SYMBOL)])
                .alias(CAP_LAG)])
            .with_columns([col(CAP_LAG).sum().over([col(DATE)]).alias(CAP_TOTAL)])
            .with_columns([when(col(CAP_TOTAL).gt(lit(0.0)))
                .then(col(CAP_LAG) / col(CAP_TOTAL))
                .otherwise(lit(NULL))
                .alias(WEIGHT)])
            .with_columns([(col(WEIGHT) * col(SIMPLE_RETURN)).alias(CONTRIBUTION)])
            .with_columns([when(col(CONTRIBUTION).count().over([col(DATE)]).gt(lit(0)))
                .then(col(CONTRIBUTION).sum().over([col(DATE)]))
                .otherwise(lit(NULL))
                .alias(MARKET_RETURN)])
            .with_columns([
                (col(SIMPLE_RETURN) - col(RISK_FREE_RATE)).alias(ASSET_EXCESS_RETURN),
                (col(MARKET_RETURN) - col(RISK_FREE_RATE)).alias(MARKET_EXCESS_RETURN),
            ])
            .select(output)
            .collect()?;

        tracing::debug!(rows = out.height(), "benchmark columns attached");
        Ok(sort_panel(&out)?)
    }
}
