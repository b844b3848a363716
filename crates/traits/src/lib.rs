#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod feature;
pub use feature::{ConfigurableFeature, Feature, FeatureColumns, FeatureError, FeatureKind};

mod transform;
pub use transform::CrossSectionTransform;

mod estimator;
pub use estimator::{EstimatorError, PanelEstimator};
