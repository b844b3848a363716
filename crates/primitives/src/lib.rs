#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod asset;
pub use asset::{AssetId, Symbol};

mod frame;
pub use frame::AssetFrame;

mod factor;
pub use factor::{FactorDescriptor, FactorName, FactorSeries, LongSide};

mod table;
pub use table::FactorTable;

mod loadings;
pub use loadings::LoadingMatrix;

mod weights;
pub use weights::MarketCapWeights;

mod dates;
pub use dates::{date_from_epoch_days, epoch_days};

pub mod columns;

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
