#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod align;

mod static_model;
pub use static_model::{
    NestedFit, RET, RET_HAT, StaticConfig, StaticFactorModel, StaticFit, nested_specs, run_nested,
};

mod dynamic_model;
pub use dynamic_model::{DynamicConfig, DynamicFactorModel, DynamicFit, RET_FWD, RET_HAT_DYN};

mod panel;
pub use panel::{IpcaConfig, IpcaPanel, IpcaPanelBuilder, PanelIndex};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use dynafactor_traits::PanelEstimator;

    pub use super::{DynamicConfig, DynamicFactorModel, ModelError, StaticConfig, StaticFactorModel};
}
