//! Stage orchestration.

use dynafactor_features::{
    AssetFailure, EngineError, FeatureConfig, FeatureEngine, FeatureRun, build_returns,
};
use dynafactor_model::{
    DynamicConfig, DynamicFactorModel, DynamicFit, IpcaConfig, IpcaPanel, IpcaPanelBuilder,
    ModelError, NestedFit, StaticConfig, run_nested,
};
use dynafactor_portfolios::{FactorBuilder, FactorSetConfig, PortfolioError};
use dynafactor_primitives::FactorTable;
use dynafactor_traits::{EstimatorError, PanelEstimator};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// A stage that could not run at all.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Returns and benchmark stage.
    #[error("returns stage: {0}")]
    Returns(#[source] EngineError),

    /// Rolling feature stage.
    #[error("feature stage: {0}")]
    Features(#[source] EngineError),

    /// Factor construction stage.
    #[error("factor stage: {0}")]
    Factors(#[from] PortfolioError),

    /// Dynamic regression.
    #[error("dynamic regression: {0}")]
    Dynamic(#[from] EstimatorError),

    /// Instrumented panel preparation.
    #[error("instrumented panel: {0}")]
    Ipca(#[from] ModelError),
}

/// Parameters of every stage.
///
/// Sections left out of a config file take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Returns, benchmark and rolling features.
    pub features: FeatureConfig,
    /// Factor set.
    pub factors: FactorSetConfig,
    /// Static regression; nested specifications use its factor list.
    pub static_model: StaticConfig,
    /// Dynamic regression.
    pub dynamic_model: DynamicConfig,
    /// Instrumented panel.
    pub ipca: IpcaConfig,
}

/// Everything the pipeline produces.
///
/// Regressions and the instrumented panel fail independently of each other.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Panel after the returns stage.
    pub returns: DataFrame,
    /// Panel after the feature stage.
    pub features: DataFrame,
    /// Per-asset feature failures of both per-asset stages.
    pub failures: Vec<AssetFailure>,
    /// Factor returns.
    pub factors: FactorTable,
    /// Nested static specifications.
    pub static_fits: Vec<NestedFit>,
    /// Dynamic regression.
    pub dynamic: Result<DynamicFit, EstimatorError>,
    /// Instrumented panel.
    pub ipca: Result<IpcaPanel, ModelError>,
}

/// Runs the stages of the pipeline with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Log and simple returns, risk-free rate, market return and excess returns.
    ///
    /// # Errors
    /// Fails on missing columns or malformed keys.
    pub fn returns(&self, panel: &DataFrame, rates: &DataFrame) -> Result<FeatureRun, PipelineError> {
        build_returns(panel, rates, &self.config.features).map_err(PipelineError::Returns)
    }

    /// Rolling characteristics of every asset.
    ///
    /// # Errors
    /// Fails on missing columns or malformed keys.
    pub fn features(&self, panel: &DataFrame) -> Result<FeatureRun, PipelineError> {
        FeatureEngine::with_defaults(&self.config.features)
            .run(panel)
            .map_err(PipelineError::Features)
    }

    /// Market and long-short factor returns.
    ///
    /// # Errors
    /// Fails on missing characteristics or invalid descriptors.
    pub fn factors(&self, panel: &DataFrame) -> Result<FactorTable, PipelineError> {
        Ok(FactorBuilder::new(self.config.factors.clone()).build(panel)?)
    }

    /// Nested static specifications, each failing on its own.
    #[must_use]
    pub fn static_models(&self, panel: &DataFrame, factors: &FactorTable) -> Vec<NestedFit> {
        run_nested(panel, factors, &self.config.static_model)
    }

    /// The dynamic regression.
    ///
    /// # Errors
    /// Fails on missing inputs or an empty modelling panel.
    pub fn dynamic_model(
        &self,
        panel: &DataFrame,
        factors: &FactorTable,
    ) -> Result<DynamicFit, PipelineError> {
        Ok(DynamicFactorModel::with_config(self.config.dynamic_model.clone()).fit(panel, factors)?)
    }

    /// The instrumented panel.
    ///
    /// # Errors
    /// Fails on missing characteristics.
    pub fn ipca_panel(&self, panel: &DataFrame) -> Result<IpcaPanel, PipelineError> {
        Ok(IpcaPanelBuilder::new(self.config.ipca.clone()).build(panel)?)
    }

    /// Run every stage.
    ///
    /// The per-asset and factor stages are fatal; each regression and the
    /// instrumented panel only fail themselves.
    ///
    /// # Errors
    /// Fails if the returns, feature or factor stage cannot run.
    pub fn run(&self, panel: &DataFrame, rates: &DataFrame) -> Result<PipelineOutput, PipelineError> {
        let FeatureRun { panel: returns, mut failures } = self.returns(panel, rates)?;
        let features = self.features(&returns)?;
        failures.extend(features.failures);
        let features = features.panel;

        let factors = self.factors(&features)?;
        let static_fits = self.static_models(&features, &factors);

        let dynamic = DynamicFactorModel::with_config(self.config.dynamic_model.clone())
            .fit(&features, &factors);
        if let Err(err) = &dynamic {
            tracing::warn!(error = %err, "dynamic regression failed");
        }
        let ipca = IpcaPanelBuilder::new(self.config.ipca.clone()).build(&features);
        if let Err(err) = &ipca {
            tracing::warn!(error = %err, "instrumented panel not built");
        }

        tracing::info!(
            rows = features.height(),
            failures = failures.len(),
            factor_dates = factors.len(),
            static_ok = static_fits.iter().filter(|f| f.outcome.is_ok()).count(),
            dynamic_ok = dynamic.is_ok(),
            "pipeline finished"
        );

        Ok(PipelineOutput { returns, features, failures, factors, static_fits, dynamic, ipca })
    }
}
