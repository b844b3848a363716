//! Linear algebra operations for factor estimation.

use ndarray::{Array1, Array2, ArrayView1};

use crate::MathError;

/// Relative eigenvalue cutoff of the equilibrated normal matrix below which
/// a direction is treated as outside the column space.
const RANK_TOLERANCE: f64 = 1e-12;

/// Smallest acceptable pivot of the equilibrated normal matrix for the
/// direct solve.
const PIVOT_TOLERANCE: f64 = 1e-10;

const MAX_JACOBI_SWEEPS: usize = 64;

/// Result of a least squares fit.
#[derive(Debug, Clone)]
pub struct LeastSquaresResult {
    /// Estimated coefficients.
    pub coefficients: Array1<f64>,
    /// Residuals `y - X b`.
    pub residuals: Array1<f64>,
    /// Numerical rank of the design.
    pub rank: usize,
}

/// Coefficients solved from accumulated normal equations.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Estimated coefficients.
    pub coefficients: Array1<f64>,
    /// Numerical rank of the design.
    pub rank: usize,
}

/// Streaming accumulator for `X'X` and `X'y`.
///
/// Rows are pushed one at a time so a pooled design never has to be
/// materialised.
#[derive(Debug, Clone)]
pub struct NormalEquations {
    xtx: Array2<f64>,
    xty: Array1<f64>,
    n_obs: usize,
}

impl NormalEquations {
    /// Empty accumulator for `n_features` regressors.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            xtx: Array2::zeros((n_features, n_features)),
            xty: Array1::zeros(n_features),
            n_obs: 0,
        }
    }

    /// Number of regressors.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.xty.len()
    }

    /// Number of rows pushed so far.
    #[must_use]
    pub const fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Add one observation.
    ///
    /// # Errors
    /// Returns [`MathError::DimensionMismatch`] if `x` has the wrong length.
    pub fn push(&mut self, x: ArrayView1<'_, f64>, y: f64) -> Result<(), MathError> {
        let p = self.n_features();
        if x.len() != p {
            return Err(MathError::DimensionMismatch { expected: p, actual: x.len() });
        }

        for i in 0..p {
            let xi = x[i];
            if xi == 0.0 {
                continue;
            }
            self.xty[i] += xi * y;
            for j in i..p {
                self.xtx[[i, j]] += xi * x[j];
            }
        }
        self.n_obs += 1;
        Ok(())
    }

    /// Solve for the least squares coefficients.
    ///
    /// Columns are equilibrated to unit diagonal first. Well-conditioned
    /// systems are solved directly; otherwise the minimum-norm solution is
    /// taken from an eigendecomposition, dropping null directions.
    ///
    /// # Errors
    /// Returns [`MathError::EmptyData`] before any row was pushed and
    /// [`MathError::NumericalInstability`] if the accumulated sums are not finite.
    pub fn solve(&self) -> Result<Solution, MathError> {
        let p = self.n_features();
        if self.n_obs == 0 || p == 0 {
            return Err(MathError::EmptyData);
        }
        if self.xtx.iter().chain(self.xty.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::NumericalInstability(
                "non-finite normal equations".to_string(),
            ));
        }

        let scale: Array1<f64> = (0..p)
            .map(|i| {
                let d = self.xtx[[i, i]];
                if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 }
            })
            .collect();

        let mut a = Array2::zeros((p, p));
        for i in 0..p {
            for j in i..p {
                let v = self.xtx[[i, j]] * scale[i] * scale[j];
                a[[i, j]] = v;
                a[[j, i]] = v;
            }
        }
        let b = &self.xty * &scale;

        let full_rank = scale.iter().all(|&s| s > 0.0);
        let direct = if full_rank { solve_linear_system(&a, &b, PIVOT_TOLERANCE).ok() } else { None };
        let (u, rank) = match direct {
            Some(u) => (u, p),
            None => pseudo_inverse_solve(&a, &b),
        };

        Ok(Solution { coefficients: u * &scale, rank })
    }
}

/// Zero-intercept least squares `argmin_b ||y - X b||^2`.
///
/// Rank-deficient designs get the minimum-norm solution.
///
/// # Errors
/// Returns error if dimensions mismatch, the design is empty or contains
/// non-finite values.
pub fn least_squares(y: &Array1<f64>, x: &Array2<f64>) -> Result<LeastSquaresResult, MathError> {
    let n = y.len();
    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    if n == 0 {
        return Err(MathError::EmptyData);
    }

    let mut normal = NormalEquations::new(x.ncols());
    for (row, &yi) in x.outer_iter().zip(y) {
        normal.push(row, yi)?;
    }
    let solution = normal.solve()?;

    let fitted = x.dot(&solution.coefficients);
    let residuals = y - &fitted;

    Ok(LeastSquaresResult { coefficients: solution.coefficients, residuals, rank: solution.rank })
}

/// Row of the Kronecker design: entry `k * L + l` is `f[k] * z[l]`.
#[must_use]
pub fn kronecker_row(f: ArrayView1<'_, f64>, z: ArrayView1<'_, f64>) -> Array1<f64> {
    let l = z.len();
    let mut out = Array1::zeros(f.len() * l);
    for (k, &fk) in f.iter().enumerate() {
        for (j, &zj) in z.iter().enumerate() {
            out[k * l + j] = fk * zj;
        }
    }
    out
}

/// Uncentred R²: `1 - sum((y - y_hat)^2) / sum(y^2)`.
///
/// `NaN` when the inputs are empty, differ in length or `sum(y^2)` is zero.
#[must_use]
pub fn total_r_squared(actual: ArrayView1<'_, f64>, fitted: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() || actual.len() != fitted.len() {
        return f64::NAN;
    }
    let ss_tot: f64 = actual.iter().map(|y| y * y).sum();
    let ss_res: f64 = actual.iter().zip(fitted).map(|(y, f)| (y - f).powi(2)).sum();
    if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { f64::NAN }
}

/// Ordinary least squares of `y` on a constant and `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleRegression {
    /// Intercept.
    pub alpha: f64,
    /// Slope.
    pub beta: f64,
    /// Residual standard error `sqrt(SSR / (n - 2))`; `NaN` when `n <= 2`.
    pub residual_std: f64,
    /// Observations used.
    pub n_obs: usize,
}

/// Fit `y = alpha + beta x + e`.
///
/// Returns `None` for fewer than two points, mismatched lengths or a
/// regressor with no variation.
#[must_use]
pub fn simple_regression(x: &[f64], y: &[f64]) -> Option<SimpleRegression> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (mut sxx, mut sxy, mut sq) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        sxx += dx * dx;
        sxy += dx * (yi - y_mean);
        sq += xi * xi;
    }
    if sxx.is_nan() || sxx <= 1e-14 * sq {
        return None;
    }

    let beta = sxy / sxx;
    let alpha = y_mean - beta * x_mean;
    let ssr: f64 = x.iter().zip(y).map(|(xi, yi)| (yi - alpha - beta * xi).powi(2)).sum();
    let residual_std = if n > 2 { (ssr / (n - 2) as f64).sqrt() } else { f64::NAN };

    Some(SimpleRegression { alpha, beta, residual_std, n_obs: n })
}

/// Solve a linear system Ax = b using Gaussian elimination with partial pivoting.
fn solve_linear_system(
    a: &Array2<f64>,
    b: &Array1<f64>,
    tolerance: f64,
) -> Result<Array1<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::LinearAlgebra("matrix must be square".to_string()));
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[[col, col]].abs();
        for row in (col + 1)..n {
            if aug[[row, col]].abs() > max_val {
                max_val = aug[[row, col]].abs();
                max_row = row;
            }
        }

        if max_val < tolerance {
            return Err(MathError::LinearAlgebra(
                "matrix is singular or nearly singular".to_string(),
            ));
        }

        if max_row != col {
            for j in 0..=n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

/// Minimum-norm solution of the symmetric positive semi-definite system `A x = b`.
fn pseudo_inverse_solve(a: &Array2<f64>, b: &Array1<f64>) -> (Array1<f64>, usize) {
    let n = a.nrows();
    let (values, vectors) = symmetric_eigen(a);
    let largest = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));

    let mut x = Array1::zeros(n);
    if largest == 0.0 {
        return (x, 0);
    }

    let cutoff = largest * RANK_TOLERANCE;
    let mut rank = 0;
    for (k, &lambda) in values.iter().enumerate() {
        if lambda > cutoff {
            let v = vectors.column(k);
            x.scaled_add(v.dot(b) / lambda, &v);
            rank += 1;
        }
    }
    (x, rank)
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns the eigenvalues and the eigenvectors as columns.
fn symmetric_eigen(a: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut m = a.clone();
    let mut v = Array2::<f64>::eye(n);
    let norm: f64 = m.iter().map(|x| x * x).sum();

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += m[[p, q]] * m[[p, q]];
            }
        }
        if off <= f64::EPSILON * f64::EPSILON * norm {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = m[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (m[[q, q]] - m[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + theta.mul_add(theta, 1.0).sqrt());
                let c = 1.0 / t.mul_add(t, 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (mkp, mkq) = (m[[k, p]], m[[k, q]]);
                    m[[k, p]] = c * mkp - s * mkq;
                    m[[k, q]] = s * mkp + c * mkq;
                }
                for k in 0..n {
                    let (mpk, mqk) = (m[[p, k]], m[[q, k]]);
                    m[[p, k]] = c * mpk - s * mqk;
                    m[[q, k]] = s * mpk + c * mqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (m.diag().to_owned(), v)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn least_squares_exact_fit() {
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let x = Array2::from_shape_vec(
            (5, 2),
            vec![1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0, 1.0, 5.0],
        )
        .unwrap();

        let result = least_squares(&y, &x).unwrap();

        // Perfect fit: y = 0 + 1*x
        assert_relative_eq!(result.coefficients[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(result.coefficients[1], 1.0, epsilon = 1e-10);
        assert_eq!(result.rank, 2);
        assert!(result.residuals.iter().all(|r| r.abs() < 1e-10));
    }

    #[test]
    fn least_squares_badly_scaled_columns() {
        // one regressor in the billions, one around 1e-3
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![1.0e9, 0.001, 2.0e9, -0.002, 3.0e9, 0.004, 4.0e9, 0.0005],
        )
        .unwrap();
        let truth = array![2.0e-9, 5.0];
        let y = x.dot(&truth);

        let result = least_squares(&y, &x).unwrap();
        assert_relative_eq!(result.coefficients[0], 2.0e-9, max_relative = 1e-8);
        assert_relative_eq!(result.coefficients[1], 5.0, max_relative = 1e-8);
    }

    #[test]
    fn least_squares_rank_deficient_is_min_norm() {
        // duplicate regressor: min-norm splits the effect evenly
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0]).unwrap();
        let y = array![2.0, 4.0, 6.0];

        let result = least_squares(&y, &x).unwrap();
        assert_eq!(result.rank, 1);
        assert_relative_eq!(result.coefficients[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.coefficients[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_column_gets_zero_coefficient() {
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0]).unwrap();
        let y = array![0.5, 1.0, 1.5];
        let result = least_squares(&y, &x).unwrap();
        assert_relative_eq!(result.coefficients[0], 0.5, epsilon = 1e-10);
        assert_relative_eq!(result.coefficients[1], 0.0);
    }

    #[test]
    fn least_squares_dimension_checks() {
        let x = Array2::zeros((3, 2));
        assert!(matches!(
            least_squares(&array![1.0, 2.0], &x),
            Err(MathError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert!(matches!(NormalEquations::new(2).solve(), Err(MathError::EmptyData)));
    }

    #[test]
    fn streaming_matches_batch() {
        let x = Array2::from_shape_vec(
            (4, 2),
            vec![1.0, 0.5, 2.0, -1.0, 0.3, 0.7, -1.2, 2.2],
        )
        .unwrap();
        let y = array![0.1, -0.4, 0.9, 0.3];

        let mut normal = NormalEquations::new(2);
        for (row, &yi) in x.outer_iter().zip(&y) {
            normal.push(row, yi).unwrap();
        }
        let streamed = normal.solve().unwrap();
        let batch = least_squares(&y, &x).unwrap();

        assert_eq!(normal.n_obs(), 4);
        for k in 0..2 {
            assert_relative_eq!(streamed.coefficients[k], batch.coefficients[k], epsilon = 1e-12);
        }
    }

    #[test]
    fn kronecker_layout() {
        let row = kronecker_row(array![1.0, 2.0].view(), array![3.0, 4.0, 5.0].view());
        assert_eq!(row.to_vec(), vec![3.0, 4.0, 5.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn r_squared_uncentred() {
        let y = array![1.0, -1.0, 2.0];
        assert_relative_eq!(total_r_squared(y.view(), y.view()), 1.0);
        let zeros = Array1::zeros(3);
        assert_relative_eq!(total_r_squared(y.view(), zeros.view()), 0.0);
        assert!(total_r_squared(zeros.view(), y.view()).is_nan());
    }

    #[test]
    fn simple_regression_recovers_line() {
        let x = [0.01, -0.02, 0.03, 0.0, 0.015];
        let y: Vec<f64> = x.iter().map(|v| 0.001 + 1.5 * v).collect();
        let fit = simple_regression(&x, &y).unwrap();
        assert_relative_eq!(fit.alpha, 0.001, epsilon = 1e-12);
        assert_relative_eq!(fit.beta, 1.5, epsilon = 1e-10);
        assert!(fit.residual_std < 1e-10);
        assert_eq!(fit.n_obs, 5);
    }

    #[test]
    fn simple_regression_degenerate() {
        assert!(simple_regression(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(simple_regression(&[1.0], &[1.0]).is_none());
        let two = simple_regression(&[0.0, 1.0], &[0.0, 2.0]).unwrap();
        assert!(two.residual_std.is_nan());
    }

    #[test]
    fn jacobi_reconstructs_matrix() {
        let a = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 2.0]];
        let (values, vectors) = symmetric_eigen(&a);
        let rebuilt = vectors.dot(&Array2::from_diag(&values)).dot(&vectors.t());
        for (x, y) in rebuilt.iter().zip(a.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-10);
        }
    }
}
