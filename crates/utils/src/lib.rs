#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dynafactor/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod fill;
pub use fill::fill_features;

mod panel;
pub use panel::{
    AssetRun, asset_runs, date_column, epoch_day_values, float_values, require_columns,
    sort_panel, symbol_values, to_float_column,
};

mod table;
pub use table::{factor_table_from_frame, factor_table_to_frame};

mod io;
pub use io::{read_csv, write_csv};

mod error;
pub use error::UtilsError;
