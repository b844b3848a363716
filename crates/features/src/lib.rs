#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod series;

mod returns;
pub use returns::PriceReturns;

mod benchmark;
pub use benchmark::{BenchmarkBuilder, RiskFreeConfig, daily_risk_free};

mod momentum;
pub use momentum::{Momentum, MomentumConfig};

mod tail_risk;
pub use tail_risk::{TailRisk, TailRiskConfig};

mod market_model;
pub use market_model::{MarketModel, MarketModelConfig};

mod realized_vol;
pub use realized_vol::{RealizedVolConfig, YangZhang};

mod liquidity;
pub use liquidity::{AmihudIlliquidity, BID_ASK, ILLIQ, SyntheticSpread};

mod volume;
pub use volume::{VolumeShock, VolumeShockConfig};

mod config;
pub use config::FeatureConfig;

mod engine;
pub use engine::{AssetFailure, FeatureEngine, FeatureRun, build_returns};

mod error;
pub use error::EngineError;

#[cfg(test)]
mod test_support;
