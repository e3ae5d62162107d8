//! Thin QR factorization of tall blocks
//!
//! Orthonormalizes the `k` columns of an `N x k` block with modified
//! Gram-Schmidt, the same projection sequence the Arnoldi process uses to
//! build a Krylov basis. `k` is the dimension of an invariant subspace and
//! stays small, so the `O(N k^2)` cost is dominated by the surrounding solves.

use crate::blas_helpers::{axpy, inner_product, scale_inplace, vector_norm};
use crate::traits::ComplexField;
use ndarray::Array2;
use num_traits::{Float, FromPrimitive, One, Zero};
use thiserror::Error;

/// Errors that can occur during QR factorization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QrError {
    #[error("column {column} is linearly dependent on the previous columns")]
    RankDeficient { column: usize },
    #[error("column {column} contains non-finite entries")]
    NonFinite { column: usize },
    #[error("block has more columns ({cols}) than rows ({rows})")]
    TooWide { rows: usize, cols: usize },
}

/// Thin QR factors: `A = Q R` with `Q` (`N x k`, orthonormal columns) and
/// `R` (`k x k`, upper triangular with positive real diagonal)
#[derive(Debug, Clone)]
pub struct QrFactorization<T: ComplexField> {
    pub q: Array2<T>,
    pub r: Array2<T>,
}

/// Compute the thin QR factorization of a tall block
pub fn thin_qr<T: ComplexField>(a: &Array2<T>) -> Result<QrFactorization<T>, QrError> {
    let (n, k) = a.dim();
    if k > n {
        return Err(QrError::TooWide { rows: n, cols: k });
    }

    let breakdown_tol = T::Real::from_f64(1e-14).unwrap_or_else(<T::Real as Float>::epsilon);

    let mut q = Array2::from_elem((n, k), T::zero());
    let mut r = Array2::from_elem((k, k), T::zero());

    for j in 0..k {
        let column = a.column(j);
        if column.iter().any(|v| !v.is_finite()) {
            return Err(QrError::NonFinite { column: j });
        }

        let original_norm = vector_norm(column);
        let mut w = column.to_owned();

        for i in 0..j {
            let r_ij = inner_product(q.column(i), w.view());
            r[[i, j]] = r_ij;
            axpy(-r_ij, q.column(i), &mut w);
        }

        let w_norm = vector_norm(w.view());
        if w_norm.is_zero() || w_norm <= breakdown_tol * original_norm {
            log::debug!("Gram-Schmidt breakdown at column {} of {}", j, k);
            return Err(QrError::RankDeficient { column: j });
        }

        r[[j, j]] = T::from_real(w_norm);
        scale_inplace(&mut w, T::from_real(T::Real::one() / w_norm));
        q.column_mut(j).assign(&w);
    }

    Ok(QrFactorization { q, r })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blas_helpers::hermitian_product;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_qr_orthonormal_and_reconstructs() {
        let a = array![
            [Complex64::new(1.0, 0.0), Complex64::new(2.0, 1.0)],
            [Complex64::new(0.0, 1.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(0.0, -1.0)],
        ];

        let QrFactorization { q, r } = thin_qr(&a).expect("QR should succeed");

        let gram = hermitian_product(&q, &q);
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!((gram[[i, j]] - expected).norm(), 0.0, epsilon = 1e-12);
            }
        }

        let qr = q.dot(&r);
        for i in 0..3 {
            for j in 0..2 {
                assert_relative_eq!((qr[[i, j]] - a[[i, j]]).norm(), 0.0, epsilon = 1e-12);
            }
        }
        assert_relative_eq!(r[[1, 0]].norm(), 0.0);
    }

    #[test]
    fn test_qr_rank_deficient() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0], [3.0, 6.0]];
        assert_eq!(
            thin_qr(&a).unwrap_err(),
            QrError::RankDeficient { column: 1 }
        );
    }

    #[test]
    fn test_qr_rejects_nan_column() {
        let a = array![[1.0_f64, f64::NAN], [0.0, 1.0]];
        assert_eq!(thin_qr(&a).unwrap_err(), QrError::NonFinite { column: 1 });
    }

    #[test]
    fn test_qr_too_wide() {
        let a = array![[1.0_f64, 0.0, 1.0]];
        assert!(matches!(thin_qr(&a), Err(QrError::TooWide { rows: 1, cols: 3 })));
    }
}
