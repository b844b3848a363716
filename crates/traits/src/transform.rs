//! Data transformation trait definitions.

use polars::prelude::*;

/// Cross-sectional data transformation.
///
/// Operates on data partitioned by date, transforming values across assets.
pub trait CrossSectionTransform: Send + Sync {
    /// Transform target column, partitioned by group column.
    ///
    /// # Arguments
    /// * `target_col` - Column to transform
    /// * `group_col` - Column to partition by (typically the date or its index)
    ///
    /// # Returns
    /// Polars expression representing the transformation.
    fn transform(&self, target_col: &str, group_col: &str) -> Expr;

    /// Returns the name of this transformation.
    fn name(&self) -> &str;
}
