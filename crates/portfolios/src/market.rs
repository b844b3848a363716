//! Market factor.

use dynafactor_primitives::{FactorName, FactorSeries};

use crate::{CrossSections, PortfolioError};

/// Cross-sectional mean of `column` on every date.
///
/// Intended for the market excess return, which is identical across assets
/// on a date, so the mean simply picks it up. Dates without a value are
/// missing.
///
/// # Errors
/// Fails if the column is absent.
pub fn market_factor(
    sections: &CrossSections,
    name: impl Into<FactorName>,
    column: &str,
) -> Result<FactorSeries, PortfolioError> {
    sections.require(&[column])?;
    let values = sections.column(column)?;

    let means = sections
        .rows()
        .iter()
        .map(|rows| {
            let (sum, n) = rows
                .iter()
                .map(|&r| values[r])
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            if n == 0 { f64::NAN } else { sum / n as f64 }
        })
        .collect();

    Ok(FactorSeries::new(name, sections.dates().to_vec(), means))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use polars::prelude::*;

    use super::*;

    #[test]
    fn mean_per_date() {
        let panel = df! {
            "symbol" => &["A", "B", "A", "B"],
            "date" => &[19_723i32, 19_723, 19_724, 19_724],
            "market_excess_return" => &[Some(0.01), Some(0.01), None, None],
        }
        .unwrap();
        let sections = CrossSections::new(&panel).unwrap();
        let mkt = market_factor(&sections, "MKT", "market_excess_return").unwrap();

        assert_eq!(mkt.name.as_str(), "MKT");
        assert_relative_eq!(mkt.values[0], 0.01);
        assert!(mkt.values[1].is_nan());
    }
}
