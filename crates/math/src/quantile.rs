//! Order statistics and quantile bucketing.

/// Quantile of ascending `sorted` values with linear interpolation:
/// position `h = (n - 1) q`, interpolating between the neighbouring order
/// statistics. `NaN` for empty input.
#[must_use]
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Sort `values` in place and return their linear-interpolated quantile.
#[must_use]
pub fn quantile_linear(values: &mut [f64], q: f64) -> f64 {
    values.sort_unstable_by(f64::total_cmp);
    quantile_sorted(values, q)
}

/// Mean of the values at or below their own `level` quantile.
///
/// Sorts `values` in place. `NaN` when no value qualifies.
#[must_use]
pub fn expected_shortfall(values: &mut [f64], level: f64) -> f64 {
    let threshold = quantile_linear(values, level);
    let (sum, n) = values
        .iter()
        .take_while(|&&v| v <= threshold)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Assign each value to one of `q` quantile buckets (1-based).
///
/// Bucket edges are the linear-interpolated quantiles at `0, 1/q, ..., 1`
/// of the finite values; repeated edges are collapsed, so fewer than `q`
/// buckets may exist. Bucket `b` holds values in `(e[b-1], e[b]]`, with the
/// first bucket also holding the minimum. Non-finite values, and every value
/// when fewer than two distinct edges remain, get `None`.
#[must_use]
pub fn quantile_buckets(values: &[f64], q: usize) -> Vec<Option<usize>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || q == 0 {
        return vec![None; values.len()];
    }
    sorted.sort_unstable_by(f64::total_cmp);

    let mut edges: Vec<f64> =
        (0..=q).map(|i| quantile_sorted(&sorted, i as f64 / q as f64)).collect();
    edges.dedup();
    if edges.len() < 2 {
        return vec![None; values.len()];
    }

    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return None;
            }
            if v == edges[0] {
                return Some(1);
            }
            // number of edges strictly below v
            let idx = edges.partition_point(|&e| e < v);
            (idx > 0 && idx < edges.len()).then_some(idx)
        })
        .collect()
}
