//! # dynafactor
//!
//! Cross-sectional asset pricing for crypto panels.
//!
//! This crate provides a unified interface to the dynafactor pipeline:
//! daily returns and a value-weighted benchmark, rolling risk and liquidity
//! characteristics, quantile-sorted long-short factors, and static and
//! characteristic-instrumented factor regressions. Individual components can
//! be enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Core type definitions
//! - `traits`: Trait abstractions
//! - `math`: Rolling windows, quantiles and least squares
//! - `utils`: Panel plumbing and CSV I/O
//! - `features`: Returns, benchmark and rolling characteristics
//! - `portfolios`: Quantile portfolios and long-short factors
//! - `model`: Static and dynamic factor regressions
//! - `pipeline`: [`Pipeline`] running every stage in order
//!
//! ## Example
//!
//! ```rust,ignore
//! use dynafactor::{Pipeline, PipelineConfig, utils::read_csv};
//!
//! let panel = read_csv("prices.csv")?;
//! let rates = read_csv("risk_free.csv")?;
//! let output = Pipeline::new(PipelineConfig::default()).run(&panel, &rates)?;
//! for nested in &output.static_fits {
//!     if let Ok(fit) = &nested.outcome {
//!         println!("{}: R² = {:.4}", nested.name, fit.r_squared);
//!     }
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use dynafactor_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use dynafactor_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use dynafactor_math as math;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use dynafactor_utils as utils;
#[cfg(feature = "features")]
#[doc(inline)]
pub use dynafactor_features as features;
#[cfg(feature = "portfolios")]
#[doc(inline)]
pub use dynafactor_portfolios as portfolios;
#[cfg(feature = "model")]
#[doc(inline)]
pub use dynafactor_model as model;

#[cfg(feature = "pipeline")]
mod pipeline;
#[cfg(feature = "pipeline")]
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineOutput};
