//! Dense LU with partial pivoting
//!
//! Pencils from a spectral discretization are small enough to factor on a
//! dense copy. A factorization is computed once and reused for every
//! column of a right-hand-side block.

use crate::sparse::CsrMatrix;
use crate::traits::ComplexField;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use num_traits::{Float, FromPrimitive};
use thiserror::Error;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuError {
    #[error("matrix is singular or nearly singular (pivot {pivot})")]
    SingularMatrix { pivot: usize },
    #[error("matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

fn pivot_tolerance<T: ComplexField>() -> T::Real {
    T::Real::from_f64(1e-30).unwrap_or_else(<T::Real as Float>::epsilon)
}

/// Packed factors of `P A = L U`
#[derive(Debug, Clone)]
pub struct LuFactorization<T: ComplexField> {
    /// Strictly lower part holds L (unit diagonal implied), the rest holds U
    pub lu: Array2<T>,
    /// Row permutation applied during elimination
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl<T: ComplexField> LuFactorization<T> {
    /// Factorize a sparse matrix through its dense image
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Result<Self, LuError> {
        lu_factorize(&matrix.to_dense())
    }

    /// Solve `A x = b` with the stored factors
    pub fn solve(&self, b: ArrayView1<T>) -> Result<Array1<T>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        let mut x = Array1::from_iter(self.pivots.iter().map(|&p| b[p]));

        // L y = P b
        for i in 0..self.n {
            for j in 0..i {
                let l_ij = self.lu[[i, j]];
                let xj = x[j];
                x[i] -= l_ij * xj;
            }
        }

        // U x = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                let u_ij = self.lu[[i, j]];
                let xj = x[j];
                x[i] -= u_ij * xj;
            }
            let u_ii = self.lu[[i, i]];
            if u_ii.norm() < pivot_tolerance::<T>() {
                return Err(LuError::SingularMatrix { pivot: i });
            }
            x[i] *= u_ii.inv();
        }

        Ok(x)
    }

    /// Solve AX = B for every column of B
    pub fn solve_block(&self, b: &Array2<T>) -> Result<Array2<T>, LuError> {
        if b.nrows() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.nrows(),
            });
        }

        let mut x = Array2::from_elem(b.dim(), T::zero());
        for (j, column) in b.axis_iter(Axis(1)).enumerate() {
            let xj = self.solve(column)?;
            x.column_mut(j).assign(&xj);
        }
        Ok(x)
    }

    /// Explicit inverse, A^-1, by solving against the identity
    pub fn inverse(&self) -> Result<Array2<T>, LuError> {
        let mut identity = Array2::from_elem((self.n, self.n), T::zero());
        identity.diag_mut().fill(T::one());
        self.solve_block(&identity)
    }
}

/// Factor a square matrix with row pivoting on the largest magnitude
pub fn lu_factorize<T: ComplexField>(a: &Array2<T>) -> Result<LuFactorization<T>, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let mut lu = a.clone();
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let mut max_val = lu[[k, k]].norm();
        let mut max_row = k;

        for i in (k + 1)..n {
            let val = lu[[i, k]].norm();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val.is_nan() || max_val < pivot_tolerance::<T>() {
            log::debug!("LU breakdown at pivot {} of {}", k, n);
            return Err(LuError::SingularMatrix { pivot: k });
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
            pivots.swap(k, max_row);
        }

        let pivot_inv = lu[[k, k]].inv();
        for i in (k + 1)..n {
            let mult = lu[[i, k]] * pivot_inv;
            lu[[i, k]] = mult;

            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    fn factor_and_solve<T: ComplexField>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>, LuError> {
        lu_factorize(a)?.solve(b.view())
    }

    #[test]
    fn test_lu_solve_complex() {
        let a = array![
            [Complex64::new(4.0, 1.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(1.0, 0.0), Complex64::new(3.0, -1.0)],
        ];
        let b = array![Complex64::new(1.0, 1.0), Complex64::new(2.0, -1.0)];

        let x = factor_and_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..2 {
            assert_relative_eq!((ax[i] - b[i]).norm(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_requires_pivoting() {
        // Zero leading entry forces a row swap
        let a = array![[0.0_f64, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
        let b = array![3.0_f64, 2.0, 4.0];

        let x = factor_and_solve(&a, &b).expect("LU solve should succeed");

        let ax = a.dot(&x);
        for i in 0..3 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lu_singular() {
        let a = array![[1.0_f64, 2.0], [2.0, 4.0]];
        let b = array![1.0_f64, 2.0];

        let result = factor_and_solve(&a, &b);
        assert!(matches!(result, Err(LuError::SingularMatrix { .. })));
    }

    #[test]
    fn test_lu_dimension_mismatch() {
        let a = array![[1.0_f64, 2.0, 3.0], [2.0, 4.0, 5.0]];
        assert!(matches!(
            lu_factorize(&a),
            Err(LuError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_lu_block_solve_and_inverse() {
        let a = array![[4.0_f64, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let factorization = lu_factorize(&a).expect("Factorization should succeed");

        let b = array![[1.0_f64, 4.0], [2.0, 5.0], [3.0, 6.0]];
        let x = factorization.solve_block(&b).expect("Block solve should succeed");
        let ax = a.dot(&x);
        for i in 0..3 {
            for j in 0..2 {
                assert_relative_eq!(ax[[i, j]], b[[i, j]], epsilon = 1e-10);
            }
        }

        let inv = factorization.inverse().expect("Inverse should succeed");
        let product = a.dot(&inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_lu_from_csr() {
        let csr = CsrMatrix::from_triplets(
            2,
            2,
            vec![
                (0, 0, Complex64::new(2.0, 0.0)),
                (1, 1, Complex64::new(0.0, 4.0)),
            ],
        );
        let lu = LuFactorization::from_csr(&csr).expect("Factorization should succeed");
        let x = lu
            .solve(array![Complex64::new(2.0, 0.0), Complex64::new(4.0, 0.0)].view())
            .expect("Solve should succeed");

        assert_relative_eq!(x[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1].im, -1.0, epsilon = 1e-12);
    }
}
