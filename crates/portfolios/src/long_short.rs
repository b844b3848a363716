//! Quantile-sorted portfolios and long-short factor returns.

use dynafactor_math::quantile_buckets;
use dynafactor_primitives::{Date, FactorDescriptor, FactorSeries, MarketCapWeights};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::{CrossSections, PortfolioError};

/// Daily returns of every quantile bucket for one characteristic.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantilePortfolios {
    /// Dates in ascending order.
    pub dates: Vec<Date>,
    /// Bucket returns, `dates x quantiles`; bucket 1 is column 0.
    pub returns: Array2<f64>,
    /// Members per bucket and date.
    pub counts: Array2<usize>,
}

impl QuantilePortfolios {
    /// Number of buckets.
    #[must_use]
    pub fn n_buckets(&self) -> usize {
        self.returns.ncols()
    }
}

/// Long-short factor built from a [`FactorDescriptor`].
///
/// On each date the rows with both a lagged characteristic and a return are
/// split into `quantiles` buckets by the lagged characteristic. A bucket's
/// return is weighted by the descriptor's weight column on the return date,
/// falling back to an equal-weighted mean when any weight in the bucket is
/// missing or non-positive. The factor is the spread between bucket 1 and
/// bucket `quantiles`, signed by the descriptor's long side.
#[derive(Debug, Clone)]
pub struct LongShortFactor {
    descriptor: FactorDescriptor,
    return_column: String,
}

impl LongShortFactor {
    /// Create the factor for the given return column.
    #[must_use]
    pub fn new(descriptor: FactorDescriptor, return_column: impl Into<String>) -> Self {
        Self { descriptor, return_column: return_column.into() }
    }

    /// Descriptor in use.
    #[must_use]
    pub const fn descriptor(&self) -> &FactorDescriptor {
        &self.descriptor
    }

    /// Panel columns read by this factor.
    #[must_use]
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns = vec![self.descriptor.characteristic.clone(), self.return_column.clone()];
        if !columns.contains(&self.descriptor.weight_column) {
            columns.push(self.descriptor.weight_column.clone());
        }
        columns
    }

    /// Check the descriptor can be applied.
    ///
    /// # Errors
    /// Returns [`PortfolioError::InvalidDescriptor`] for fewer than two
    /// quantiles, a zero lag or an empty characteristic name.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        let invalid = |reason: &str| PortfolioError::InvalidDescriptor {
            factor: self.descriptor.name.to_string(),
            reason: reason.to_string(),
        };
        if self.descriptor.quantiles < 2 {
            return Err(invalid("needs at least 2 quantiles"));
        }
        // the sort key must predate the return it ranks
        if self.descriptor.lag == 0 {
            return Err(invalid("characteristic lag must be at least 1 row"));
        }
        if self.descriptor.characteristic.is_empty() {
            return Err(invalid("characteristic is empty"));
        }
        Ok(())
    }

    /// Bucket returns on every date of the panel.
    ///
    /// # Errors
    /// Fails on an invalid descriptor or a missing column.
    pub fn portfolios(&self, sections: &CrossSections) -> Result<QuantilePortfolios, PortfolioError> {
        self.validate()?;
        sections.require(&self.required_columns())?;

        let q = self.descriptor.quantiles;
        let signal = sections.lagged(&self.descriptor.characteristic, self.descriptor.lag)?;
        let returns = sections.column(&self.return_column)?;
        let weights = sections.column(&self.descriptor.weight_column)?;

        let per_date: Vec<(Vec<f64>, Vec<usize>)> = sections
            .rows()
            .par_iter()
            .map(|rows| bucket_returns(rows, &signal, &returns, &weights, q))
            .collect();

        let n = per_date.len();
        let mut out = Array2::from_elem((n, q), f64::NAN);
        let mut counts = Array2::zeros((n, q));
        for (t, (rets, members)) in per_date.into_iter().enumerate() {
            for b in 0..q {
                out[[t, b]] = rets[b];
                counts[[t, b]] = members[b];
            }
        }

        Ok(QuantilePortfolios { dates: sections.dates().to_vec(), returns: out, counts })
    }

    /// Long-short return on every date of the panel.
    ///
    /// # Errors
    /// Fails on an invalid descriptor or a missing column.
    pub fn build(&self, sections: &CrossSections) -> Result<FactorSeries, PortfolioError> {
        let ports = self.portfolios(sections)?;
        let top = ports.n_buckets() - 1;
        let side = self.descriptor.long_side;

        let values: Vec<f64> = ports
            .returns
            .rows()
            .into_iter()
            .map(|row| side.spread(row[0], row[top]))
            .collect();

        let series = FactorSeries::new(self.descriptor.name.clone(), ports.dates, values);
        tracing::debug!(
            factor = %series.name,
            characteristic = %self.descriptor.characteristic,
            valid = series.n_valid(),
            dates = series.len(),
            "built long-short factor"
        );
        Ok(series)
    }
}

/// Weighted return and member count of every bucket in one cross-section.
fn bucket_returns(
    rows: &[usize],
    signal: &Array1<f64>,
    returns: &Array1<f64>,
    weights: &Array1<f64>,
    q: usize,
) -> (Vec<f64>, Vec<usize>) {
    let usable: Vec<usize> =
        rows.iter().copied().filter(|&r| signal[r].is_finite() && returns[r].is_finite()).collect();
    let values: Vec<f64> = usable.iter().map(|&r| signal[r]).collect();
    let labels = quantile_buckets(&values, q);

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); q];
    for (&row, label) in usable.iter().zip(labels) {
        if let Some(bucket) = label.filter(|b| (1..=q).contains(b)) {
            members[bucket - 1].push(row);
        }
    }

    let rets = members
        .iter()
        .map(|rows| {
            let caps: Array1<f64> = rows.iter().map(|&r| weights[r]).collect();
            let rets: Array1<f64> = rows.iter().map(|&r| returns[r]).collect();
            MarketCapWeights::from_raw(caps).weighted_mean(&rets)
        })
        .collect();

    (rets, members.iter().map(Vec::len).collect())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use dynafactor_primitives::LongSide;
    use polars::prelude::*;
    use rstest::rstest;

    use super::*;

    /// Ten assets over two dates; the signal on day one ranks assets 0..9.
    fn panel(caps: &[f64; 10]) -> DataFrame {
        let mut symbols = Vec::new();
        let mut dates = Vec::new();
        let mut signal = Vec::new();
        let mut ret = Vec::new();
        let mut cap = Vec::new();
        for i in 0..10 {
            for day in 0..2 {
                symbols.push(format!("S{i}"));
                dates.push(19_723 + day);
                signal.push(i as f64);
                ret.push(if day == 0 { f64::NAN } else { 0.01 * i as f64 });
                cap.push(caps[i]);
            }
        }
        let ret: Vec<Option<f64>> = ret.into_iter().map(|r: f64| r.is_finite().then_some(r)).collect();
        df! {
            "symbol" => symbols,
            "date" => dates,
            "signal" => signal,
            "ret" => ret,
            "market_cap" => cap,
        }
        .unwrap()
    }

    fn descriptor(side: LongSide) -> FactorDescriptor {
        FactorDescriptor::new("SIG", "signal", side)
    }

    #[rstest]
    #[case(LongSide::High, 0.08)]
    #[case(LongSide::Low, -0.08)]
    fn equal_caps_give_bucket_means(#[case] side: LongSide, #[case] expected: f64) {
        let sections = CrossSections::new(&panel(&[1.0; 10])).unwrap();
        let series = LongShortFactor::new(descriptor(side), "ret").build(&sections).unwrap();

        // first date has no lagged signal
        assert!(series.values[0].is_nan());
        // bottom bucket {0, 1} mean 0.005, top {8, 9} mean 0.085
        assert_relative_eq!(series.values[1], expected, epsilon = 1e-12);
    }

    #[test]
    fn value_weighting_and_fallback() {
        let mut caps = [1.0; 10];
        caps[0] = 3.0;
        caps[8] = 0.0;
        let sections = CrossSections::new(&panel(&caps)).unwrap();
        let ports = LongShortFactor::new(descriptor(LongSide::High), "ret").portfolios(&sections).unwrap();

        // bottom: (3 * 0.00 + 1 * 0.01) / 4
        assert_relative_eq!(ports.returns[[1, 0]], 0.0025, epsilon = 1e-12);
        // top holds a zero cap, so it is equal weighted
        assert_relative_eq!(ports.returns[[1, 4]], 0.085, epsilon = 1e-12);
        assert_eq!(ports.counts.row(1).to_vec(), vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn merged_buckets_leave_top_empty() {
        let mut df = panel(&[1.0; 10]);
        let flat = Column::new("signal".into(), vec![1.0; 20]);
        df.with_column(flat).unwrap();
        let sections = CrossSections::new(&df).unwrap();
        let series = LongShortFactor::new(descriptor(LongSide::High), "ret").build(&sections).unwrap();
        assert!(series.values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rejects_single_quantile() {
        let sections = CrossSections::new(&panel(&[1.0; 10])).unwrap();
        let factor = LongShortFactor::new(descriptor(LongSide::High).with_quantiles(1), "ret");
        assert!(matches!(factor.build(&sections), Err(PortfolioError::InvalidDescriptor { .. })));
    }

    #[test]
    fn rejects_same_day_characteristic() {
        let sections = CrossSections::new(&panel(&[1.0; 10])).unwrap();
        let factor = LongShortFactor::new(descriptor(LongSide::High).with_lag(0), "ret");
        let err = factor.build(&sections).unwrap_err();
        assert!(
            matches!(&err, PortfolioError::InvalidDescriptor { factor, reason } if factor == "SIG" && reason.contains("lag"))
        );
        assert!(LongShortFactor::new(descriptor(LongSide::High).with_lag(2), "ret").validate().is_ok());
    }

    #[test]
    fn missing_weight_column() {
        let sections = CrossSections::new(&panel(&[1.0; 10])).unwrap();
        let factor = LongShortFactor::new(descriptor(LongSide::High).with_weight_column("volume"), "ret");
        assert!(matches!(factor.build(&sections), Err(PortfolioError::Utils(_))));
    }
}
