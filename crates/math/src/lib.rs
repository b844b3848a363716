#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod rolling;
pub use rolling::RollingWindow;

mod quantile;
pub use quantile::{expected_shortfall, quantile_buckets, quantile_linear, quantile_sorted};

mod linalg;
pub use linalg::{
    LeastSquaresResult, NormalEquations, SimpleRegression, Solution, kronecker_row,
    least_squares, simple_regression, total_r_squared,
};

mod cross_section;
pub use cross_section::{MedianImpute, Standardize, median_fill_xsection, standardize_xsection};

mod error;
pub use error::MathError;
