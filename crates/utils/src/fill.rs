//! Feature filling utilities.

use polars::prelude::*;

/// Forward fill missing values in feature columns.
///
/// Casts to float, sorts by `sort_col` and carries the last observation
/// forward, within each `over_col` partition when one is given.
///
/// # Arguments
/// * `df` - Input LazyFrame
/// * `features` - Column names to fill
/// * `sort_col` - Column to sort by (typically "date")
/// * `over_col` - Optional partition column (typically "symbol")
///
/// # Returns
/// LazyFrame with filled features.
pub fn fill_features(
    df: LazyFrame,
    features: &[&str],
    sort_col: &str,
    over_col: Option<&str>,
) -> LazyFrame {
    let sort_options = SortMultipleOptions::new().with_maintain_order(true);
    let mut lf = df.sort([sort_col], sort_options);

    for &feat in features {
        let filled = col(feat).cast(DataType::Float64).forward_fill(None);
        let filled = match over_col {
            Some(over) => filled.over([col(over)]),
            None => filled,
        };
        lf = lf.with_column(filled.alias(feat));
    }

    lf
}
