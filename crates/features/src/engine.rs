//! Runs per-asset features over a whole panel.

use std::collections::BTreeSet;

use dynafactor_primitives::{AssetFrame, Symbol, date_from_epoch_days};
use dynafactor_traits::{ConfigurableFeature, Feature, FeatureError, FeatureKind};
use dynafactor_utils::{
    AssetRun, UtilsError, asset_runs, epoch_day_values, float_values, require_columns, sort_panel,
    to_float_column,
};
use ndarray::{Array1, s};
use polars::prelude::*;
use rayon::prelude::*;

use crate::{
    AmihudIlliquidity, BenchmarkBuilder, EngineError, FeatureConfig, MarketModel, Momentum,
    PriceReturns, SyntheticSpread, TailRisk, VolumeShock, YangZhang,
};

/// A feature that could not be computed for one asset.
///
/// The asset's outputs for that feature are left missing; other assets and
/// other features are unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    /// Asset whose series failed.
    pub symbol: Symbol,
    /// Feature name.
    pub feature: String,
    /// Family of the failed feature.
    pub kind: FeatureKind,
    /// Error message.
    pub reason: String,
}

/// Result of a feature run: the enriched panel plus per-asset failures.
#[derive(Debug, Clone)]
pub struct FeatureRun {
    /// Input panel sorted by `(symbol, date)` with the feature columns appended.
    pub panel: DataFrame,
    /// Failures collected across the batch.
    pub failures: Vec<AssetFailure>,
}

/// Ordered collection of features applied to every asset.
///
/// Features run in registration order within an asset, so a feature may read
/// columns produced by an earlier one. Assets are processed in parallel.
#[derive(Debug, Default)]
pub struct FeatureEngine {
    features: Vec<Box<dyn Feature>>,
}

impl FeatureEngine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in rolling features with the given parameters.
    #[must_use]
    pub fn with_defaults(config: &FeatureConfig) -> Self {
        Self::new()
            .with_feature(Momentum::with_config(config.momentum.clone()))
            .with_feature(TailRisk::with_config(config.tail_risk))
            .with_feature(MarketModel::with_config(config.market_model))
            .with_feature(YangZhang::with_config(config.realized_vol))
            .with_feature(AmihudIlliquidity)
            .with_feature(SyntheticSpread)
            .with_feature(VolumeShock::with_config(config.volume_shock.clone()))
    }

    /// Append a feature.
    #[must_use]
    pub fn with_feature(mut self, feature: impl Feature + 'static) -> Self {
        self.features.push(Box::new(feature));
        self
    }

    /// Registered features.
    pub fn features(&self) -> impl Iterator<Item = &dyn Feature> {
        self.features.iter().map(AsRef::as_ref)
    }

    /// Panel columns the registered features need that none of them produce first.
    #[must_use]
    pub fn required_columns(&self) -> Vec<String> {
        let mut produced: BTreeSet<String> = BTreeSet::new();
        let mut required: Vec<String> = Vec::new();
        for feature in &self.features {
            for column in feature.required_columns() {
                if !produced.contains(&column) && !required.contains(&column) {
                    required.push(column);
                }
            }
            produced.extend(feature.output_columns());
        }
        required
    }

    /// Output columns of all registered features, in order.
    #[must_use]
    pub fn output_columns(&self) -> Vec<String> {
        self.features.iter().flat_map(|f| f.output_columns()).collect()
    }

    /// Compute every feature for every asset of `panel`.
    ///
    /// # Errors
    /// Fails if the panel is empty, lacks a required column or has null keys.
    /// Errors inside a single asset's series are recorded in
    /// [`FeatureRun::failures`] instead.
    pub fn run(&self, panel: &DataFrame) -> Result<FeatureRun, EngineError> {
        let required = self.required_columns();
        require_columns(panel, &required)?;
        if panel.height() == 0 {
            return Err(UtilsError::EmptyPanel.into());
        }

        let sorted = sort_panel(panel)?;
        let runs = asset_runs(&sorted)?;
        let days = epoch_day_values(&sorted)?;
        let inputs: Vec<(String, Array1<f64>)> = required
            .iter()
            .map(|name| Ok((name.clone(), float_values(&sorted, name)?)))
            .collect::<Result<_, UtilsError>>()?;

        tracing::debug!(assets = runs.len(), rows = sorted.height(), "running feature engine");

        let results: Vec<(Vec<Array1<f64>>, Vec<AssetFailure>)> =
            runs.par_iter().map(|run| self.run_asset(run, &days, &inputs)).collect();

        let outputs = self.output_columns();
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(sorted.height()); outputs.len()];
        let mut failures = Vec::new();
        for (asset_columns, asset_failures) in results {
            for (column, values) in columns.iter_mut().zip(asset_columns) {
                column.extend(values.iter().copied());
            }
            failures.extend(asset_failures);
        }

        let mut out = sorted;
        for (name, values) in outputs.iter().zip(&columns) {
            out.with_column(to_float_column(name, values))?;
        }

        if !failures.is_empty() {
            tracing::warn!(failures = failures.len(), "some asset series failed");
        }
        Ok(FeatureRun { panel: out, failures })
    }

    fn run_asset(
        &self,
        run: &AssetRun,
        days: &[i32],
        inputs: &[(String, Array1<f64>)],
    ) -> (Vec<Array1<f64>>, Vec<AssetFailure>) {
        let mut frame = match asset_frame(run, days, inputs) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(symbol = %run.symbol, error = %err, "asset rows unusable");
                let failures = self.features.iter().map(|f| failure(run, f.as_ref(), &err)).collect();
                let outputs = vec![Array1::from_elem(run.len, f64::NAN); self.output_columns().len()];
                return (outputs, failures);
            }
        };

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for feature in &self.features {
            let names = feature.output_columns();
            let stored = compute_checked(feature.as_ref(), &frame, &names).and_then(|columns| {
                for (name, values) in names.iter().zip(&columns) {
                    frame.insert(name.clone(), values.clone()).map_err(|rejected| {
                        FeatureError::LengthMismatch {
                            column: name.clone(),
                            expected: run.len,
                            actual: rejected.len(),
                        }
                    })?;
                }
                Ok(columns)
            });
            match stored {
                Ok(columns) => outputs.extend(columns),
                Err(err) => {
                    tracing::warn!(symbol = %run.symbol, feature = feature.name(), kind = %feature.kind(), error = %err, "feature failed");
                    failures.push(failure(run, feature.as_ref(), &err));
                    for name in names {
                        frame.insert_missing(name);
                        outputs.push(Array1::from_elem(run.len, f64::NAN));
                    }
                }
            }
        }

        (outputs, failures)
    }
}

fn failure(run: &AssetRun, feature: &dyn Feature, err: &FeatureError) -> AssetFailure {
    AssetFailure {
        symbol: run.symbol.clone(),
        feature: feature.name().to_string(),
        kind: feature.kind(),
        reason: err.to_string(),
    }
}

/// Slice one asset's rows out of the sorted panel.
fn asset_frame(
    run: &AssetRun,
    days: &[i32],
    inputs: &[(String, Array1<f64>)],
) -> Result<AssetFrame, FeatureError> {
    let range = run.range();
    let dates = days[range.clone()]
        .iter()
        .map(|&d| {
            date_from_epoch_days(d)
                .ok_or_else(|| FeatureError::Computation(format!("date {d} days from epoch is out of range")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut frame = AssetFrame::new(run.symbol.clone(), dates);
    for (name, values) in inputs {
        frame.insert(name.clone(), values.slice(s![range.clone()]).to_owned()).map_err(|rejected| {
            FeatureError::LengthMismatch { column: name.clone(), expected: run.len, actual: rejected.len() }
        })?;
    }
    Ok(frame)
}

/// Run a feature and check that it returned its declared columns at full length.
fn compute_checked(
    feature: &dyn Feature,
    frame: &AssetFrame,
    names: &[String],
) -> Result<Vec<Array1<f64>>, FeatureError> {
    let computed = feature.compute(frame)?;
    names
        .iter()
        .map(|name| {
            let (_, values) = computed
                .iter()
                .find(|(n, _)| n == name)
                .ok_or_else(|| FeatureError::Computation(format!("{} did not produce {name}", feature.name())))?;
            if values.len() != frame.len() {
                return Err(FeatureError::LengthMismatch {
                    column: name.clone(),
                    expected: frame.len(),
                    actual: values.len(),
                });
            }
            Ok(values.clone())
        })
        .collect()
}

/// Returns and benchmark stage: log/simple returns, then the risk-free,
/// market and excess-return columns.
///
/// # Errors
/// Fails on malformed panel or rate tables.
pub fn build_returns(
    panel: &DataFrame,
    rates: &DataFrame,
    config: &FeatureConfig,
) -> Result<FeatureRun, EngineError> {
    let FeatureRun { panel, failures } = FeatureEngine::new().with_feature(PriceReturns).run(panel)?;
    let panel = BenchmarkBuilder::new(config.risk_free.clone()).build(&panel, rates)?;
    Ok(FeatureRun { panel, failures })
}

#[cfg(test)]
mod tests {
    use dynafactor_primitives::columns::{CLOSE, LOG_RETURN};
    use dynafactor_traits::FeatureColumns;

    use super::*;

    #[derive(Debug)]
    struct FailsFor(&'static str);

    impl Feature for FailsFor {
        fn name(&self) -> &str {
            "fails_for"
        }

        fn kind(&self) -> FeatureKind {
            FeatureKind::Return
        }

        fn required_columns(&self) -> Vec<String> {
            vec![LOG_RETURN.to_string()]
        }

        fn output_columns(&self) -> Vec<String> {
            vec!["doubled".to_string()]
        }

        fn compute(&self, frame: &AssetFrame) -> Result<FeatureColumns, FeatureError> {
            if frame.symbol().as_str() == self.0 {
                return Err(FeatureError::Computation("boom".to_string()));
            }
            let r = frame.column(LOG_RETURN).ok_or_else(|| FeatureError::MissingInput(LOG_RETURN.into()))?;
            Ok(vec![("doubled".to_string(), r * 2.0)])
        }
    }

    fn panel() -> DataFrame {
        df! {
            "symbol" => &["B", "A", "B", "A", "B", "A"],
            "date" => &[19_723i32, 19_723, 19_724, 19_724, 19_725, 19_725],
            "close" => &[10.0, 100.0, 11.0, 100.0, 12.1, 110.0],
        }
        .unwrap()
    }

    fn column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn chained_features_see_earlier_outputs() {
        let engine = FeatureEngine::new().with_feature(PriceReturns).with_feature(FailsFor("none"));
        assert_eq!(engine.required_columns(), vec![CLOSE.to_string()]);

        let run = engine.run(&panel()).unwrap();
        assert!(run.failures.is_empty());

        let doubled = column(&run.panel, "doubled");
        let log = column(&run.panel, LOG_RETURN);
        // sorted: A rows first
        assert_eq!(doubled[0], None);
        assert!((doubled[4].unwrap() - 2.0 * log[4].unwrap()).abs() < 1e-12);
    }

    #[test]
    fn failure_is_isolated_to_one_asset() {
        let engine = FeatureEngine::new().with_feature(PriceReturns).with_feature(FailsFor("B"));
        let run = engine.run(&panel()).unwrap();

        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].symbol.as_str(), "B");
        assert_eq!(run.failures[0].feature, "fails_for");
        assert_eq!(run.failures[0].kind, FeatureKind::Return);

        let doubled = column(&run.panel, "doubled");
        assert!(doubled[2].is_some());
        assert!(doubled[3..].iter().all(Option::is_none));
    }

    #[test]
    fn unrepresentable_dates_fail_only_their_asset() {
        let mut df = panel();
        df.with_column(Column::new(
            "date".into(),
            &[19_723i32, 19_723, 19_724, 19_724, 19_725, 100_000_000],
        ))
        .unwrap();
        let engine = FeatureEngine::new().with_feature(PriceReturns).with_feature(FailsFor("none"));
        let run = engine.run(&df).unwrap();

        let failed: Vec<(&str, &str)> =
            run.failures.iter().map(|f| (f.symbol.as_str(), f.feature.as_str())).collect();
        assert_eq!(failed, [("A", "price_returns"), ("A", "fails_for")]);
        assert!(run.failures[0].reason.contains("out of range"));

        // A's rows come first and stay missing; B is computed
        let doubled = column(&run.panel, "doubled");
        assert!(doubled[..3].iter().all(Option::is_none));
        assert!(doubled[4].is_some());
    }

    #[test]
    fn missing_columns_abort() {
        let engine = FeatureEngine::with_defaults(&FeatureConfig::default());
        let err = engine.run(&panel()).unwrap_err();
        assert!(err.is_missing_columns());
    }

    #[test]
    fn empty_panel_aborts() {
        let empty = panel().head(Some(0));
        let err = FeatureEngine::new().with_feature(PriceReturns).run(&empty).unwrap_err();
        assert!(matches!(err, EngineError::Utils(UtilsError::EmptyPanel)));
    }

    #[test]
    fn default_outputs_are_unique() {
        let outputs = FeatureEngine::with_defaults(&FeatureConfig::default()).output_columns();
        let unique: BTreeSet<&String> = outputs.iter().collect();
        assert_eq!(unique.len(), outputs.len());
        assert!(outputs.contains(&"rvol_yz_30".to_string()));
        assert!(outputs.contains(&"bid_ask".to_string()));
    }
}
