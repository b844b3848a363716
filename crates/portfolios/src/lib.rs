#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod sections;
pub use sections::CrossSections;

mod long_short;
pub use long_short::{LongShortFactor, QuantilePortfolios};

mod market;
pub use market::market_factor;

mod builder;
pub use builder::{FactorBuilder, FactorSetConfig, MarketFactorConfig};

mod error;
pub use error::PortfolioError;
