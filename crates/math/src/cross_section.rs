//! Cross-sectional statistical operations.

use dynafactor_traits::CrossSectionTransform;
use polars::prelude::*;

/// Fill nulls with the median of the same group.
///
/// # Arguments
/// * `target_col` - Column to fill
/// * `over_col` - Column to partition by (typically the date index)
///
/// # Returns
/// Polars expression for the imputed values. Groups with no observed value stay null.
pub fn median_fill_xsection(target_col: &str, over_col: &str) -> Expr {
    col(target_col).fill_null(col(target_col).median().over([col(over_col)]))
}

/// Cross-sectionally standardize a column: `(x - mean) / std` within each group.
///
/// Uses the population standard deviation. A zero deviation is replaced by
/// one, and groups with a single row are returned unchanged.
pub fn standardize_xsection(target_col: &str, over_col: &str) -> Expr {
    let mean = col(target_col).mean().over([col(over_col)]);
    let std = col(target_col).std(0).over([col(over_col)]);
    let safe_std = when(std.clone().eq(lit(0.0))).then(lit(1.0)).otherwise(std);
    let rows = col(target_col).len().over([col(over_col)]);

    when(rows.gt(lit(1)))
        .then((col(target_col) - mean) / safe_std)
        .otherwise(col(target_col).cast(DataType::Float64))
}

/// Per-date median imputation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianImpute;

impl CrossSectionTransform for MedianImpute {
    fn transform(&self, target_col: &str, group_col: &str) -> Expr {
        median_fill_xsection(target_col, group_col).alias(target_col)
    }

    fn name(&self) -> &str {
        "median_impute"
    }
}

/// Per-date z-scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standardize;

impl CrossSectionTransform for Standardize {
    fn transform(&self, target_col: &str, group_col: &str) -> Expr {
        standardize_xsection(target_col, group_col).alias(target_col)
    }

    fn name(&self) -> &str {
        "standardize"
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn frame() -> DataFrame {
        df! {
            "t" => &[1i64, 1, 1, 2, 3, 3],
            "x" => &[Some(1.0), None, Some(3.0), Some(7.0), Some(5.0), Some(5.0)],
        }
        .unwrap()
    }

    fn values(df: &DataFrame) -> Vec<Option<f64>> {
        df.column("x").unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn median_fills_within_group() {
        let out = frame().lazy().with_column(MedianImpute.transform("x", "t")).collect().unwrap();
        assert_eq!(values(&out)[1], Some(2.0));
    }

    #[test]
    fn standardize_handles_degenerate_groups() {
        let out = frame()
            .lazy()
            .with_column(MedianImpute.transform("x", "t"))
            .with_column(Standardize.transform("x", "t"))
            .collect()
            .unwrap();
        let v = values(&out);

        // t = 1: [1, 2, 3], population std sqrt(2/3)
        let std = (2.0f64 / 3.0).sqrt();
        assert_relative_eq!(v[0].unwrap(), -1.0 / std, epsilon = 1e-12);
        assert_relative_eq!(v[1].unwrap(), 0.0, epsilon = 1e-12);
        // single-row date left as is
        assert_relative_eq!(v[3].unwrap(), 7.0);
        // zero dispersion divides by one
        assert_relative_eq!(v[4].unwrap(), 0.0);
    }

    #[test]
    fn transform_names() {
        assert_eq!(MedianImpute.name(), "median_impute");
        assert_eq!(Standardize.name(), "standardize");
    }
}
