//! Assembly of the full factor set.

use std::collections::BTreeSet;

use dynafactor_primitives::{
    FactorDescriptor, FactorName, FactorTable, LongSide,
    columns::{ASSET_EXCESS_RETURN, MARKET_CAP, MARKET_EXCESS_RETURN},
};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::{CrossSections, LongShortFactor, PortfolioError, market_factor};

/// Source of the market factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketFactorConfig {
    /// Factor name.
    pub name: FactorName,
    /// Panel column averaged per date.
    pub column: String,
}

impl Default for MarketFactorConfig {
    fn default() -> Self {
        Self { name: FactorName::new("MKT"), column: MARKET_EXCESS_RETURN.to_string() }
    }
}

/// The factors to build and the return they explain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorSetConfig {
    /// Market factor, placed first when present.
    pub market: Option<MarketFactorConfig>,
    /// Return column sorted into portfolios.
    pub return_column: String,
    /// Long-short factors, in output order.
    pub factors: Vec<FactorDescriptor>,
}

impl Default for FactorSetConfig {
    /// Market plus size, momentum, liquidity, volatility and reversal.
    fn default() -> Self {
        Self {
            market: Some(MarketFactorConfig::default()),
            return_column: ASSET_EXCESS_RETURN.to_string(),
            factors: vec![
                FactorDescriptor::new("SIZE", MARKET_CAP, LongSide::Low),
                FactorDescriptor::new("MOM", "mom_21", LongSide::High),
                FactorDescriptor::new("LIQ", "bid_ask", LongSide::High),
                FactorDescriptor::new("VOL", "rvol_yz_30", LongSide::High),
                FactorDescriptor::new("REV", "rev", LongSide::Low),
            ],
        }
    }
}

impl FactorSetConfig {
    /// Output factor names, market first.
    #[must_use]
    pub fn names(&self) -> Vec<FactorName> {
        self.market
            .iter()
            .map(|m| m.name.clone())
            .chain(self.factors.iter().map(|d| d.name.clone()))
            .collect()
    }
}

/// Builds a [`FactorTable`] from a feature panel.
#[derive(Debug, Clone, Default)]
pub struct FactorBuilder {
    config: FactorSetConfig,
}

impl FactorBuilder {
    /// Create a builder.
    #[must_use]
    pub const fn new(config: FactorSetConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &FactorSetConfig {
        &self.config
    }

    /// Panel columns needed by every configured factor.
    #[must_use]
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.config.market.iter().map(|m| m.column.clone()).collect();
        for descriptor in &self.config.factors {
            for column in self.long_short(descriptor).required_columns() {
                if !columns.contains(&column) {
                    columns.push(column);
                }
            }
        }
        columns
    }

    fn long_short(&self, descriptor: &FactorDescriptor) -> LongShortFactor {
        LongShortFactor::new(descriptor.clone(), self.config.return_column.clone())
    }

    /// Build every factor on every date of the panel.
    ///
    /// Dates where a factor cannot be formed hold `NaN`; use
    /// [`FactorTable::complete`] to keep only fully populated dates.
    ///
    /// # Errors
    /// Fails on duplicate factor names, invalid descriptors, missing columns
    /// or an empty panel.
    pub fn build(&self, panel: &DataFrame) -> Result<FactorTable, PortfolioError> {
        let names = self.config.names();
        let mut seen = BTreeSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(*n)) {
            return Err(PortfolioError::InvalidDescriptor {
                factor: dup.to_string(),
                reason: "duplicate factor name".to_string(),
            });
        }
        for descriptor in &self.config.factors {
            self.long_short(descriptor).validate()?;
        }

        let sections = CrossSections::new(panel)?;
        sections.require(&self.required_columns())?;

        let mut series = Vec::with_capacity(names.len());
        if let Some(market) = &self.config.market {
            series.push(market_factor(&sections, market.name.clone(), &market.column)?);
        }
        for descriptor in &self.config.factors {
            series.push(self.long_short(descriptor).build(&sections)?);
        }

        for s in series.iter().filter(|s| s.n_valid() == 0) {
            tracing::warn!(factor = %s.name, "factor has no valid dates");
        }

        let table = FactorTable::from_series(&series);
        tracing::info!(
            factors = table.n_factors(),
            dates = table.len(),
            complete = table.complete().len(),
            assets = sections.n_assets(),
            "factor table built"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    #[test]
    fn default_factor_set() {
        let config = FactorSetConfig::default();
        let names: Vec<String> = config.names().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["MKT", "SIZE", "MOM", "LIQ", "VOL", "REV"]);
        assert!(config.factors.iter().all(|d| d.lag == 1 && d.quantiles == 5));
        assert_eq!(config.factors[0].long_side, LongSide::Low);
    }

    #[test]
    fn required_columns_are_deduplicated() {
        let builder = FactorBuilder::default();
        let columns = builder.required_columns();
        assert_eq!(columns.iter().filter(|c| c.as_str() == MARKET_CAP).count(), 1);
        assert!(columns.contains(&"bid_ask".to_string()));
        assert!(columns.contains(&ASSET_EXCESS_RETURN.to_string()));
    }

    #[test]
    fn duplicate_names_rejected() {
        let config = FactorSetConfig {
            factors: vec![FactorDescriptor::new("MKT", "rev", LongSide::Low)],
            ..FactorSetConfig::default()
        };
        let panel = df! { "symbol" => &["A"], "date" => &[19_723i32] }.unwrap();
        let err = FactorBuilder::new(config).build(&panel).unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidDescriptor { .. }));
    }
}
