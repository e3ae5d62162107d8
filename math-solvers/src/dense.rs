//! Small dense kernels backed by nalgebra
//!
//! Singular values of the reduced `k x k` operators that appear in the
//! resolvent-norm evaluation. The matrices are copied into an
//! `nalgebra::DMatrix` and decomposed there.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use num_complex::Complex64;

fn to_dmatrix(a: &Array2<Complex64>) -> DMatrix<Complex64> {
    let (rows, cols) = a.dim();
    DMatrix::from_fn(rows, cols, |i, j| a[[i, j]])
}

/// All singular values of a dense complex matrix, sorted in descending order
pub fn singular_values(a: &Array2<Complex64>) -> Array1<f64> {
    if a.is_empty() {
        return Array1::zeros(0);
    }

    let mut values: Vec<f64> = to_dmatrix(a).singular_values().iter().copied().collect();
    values.sort_by(|x, y| y.total_cmp(x));
    Array1::from_vec(values)
}

/// Smallest singular value σ_min(A)
///
/// For a square matrix this is `1 / ||A^-1||_2` (zero when A is singular).
pub fn min_singular_value(a: &Array2<Complex64>) -> f64 {
    singular_values(a).iter().copied().fold(f64::INFINITY, f64::min)
}

/// Largest singular value σ_max(A), the spectral norm ||A||_2
pub fn max_singular_value(a: &Array2<Complex64>) -> f64 {
    singular_values(a).iter().copied().fold(0.0, f64::max)
}
