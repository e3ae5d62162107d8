//! Vector and block kernels used by the factorizations
//!
//! Plain Rust loops over `ndarray` storage; the blocks handled here are
//! tall and thin (`N x k` with small `k`), so no BLAS dispatch is attempted.

use crate::traits::ComplexField;
use ndarray::{Array1, Array2, ArrayView1};
use num_traits::{Float, Zero};

/// `x^H y`
#[inline]
pub fn inner_product<T: ComplexField>(x: ArrayView1<T>, y: ArrayView1<T>) -> T {
    assert_eq!(x.len(), y.len(), "inner product of unequal lengths");
    x.iter()
        .zip(y.iter())
        .fold(T::zero(), |acc, (xi, yi)| acc + xi.conj() * *yi)
}

/// Euclidean norm
#[inline]
pub fn vector_norm<T: ComplexField>(x: ArrayView1<T>) -> T::Real
where
    T::Real: Float,
{
    vector_norm_sqr(x).sqrt()
}

/// Squared Euclidean norm
#[inline]
pub fn vector_norm_sqr<T: ComplexField>(x: ArrayView1<T>) -> T::Real {
    x.iter().fold(T::Real::zero(), |acc, xi| acc + xi.norm_sqr())
}

/// `y += alpha x`
#[inline]
pub fn axpy<T: ComplexField>(alpha: T, x: ArrayView1<T>, y: &mut Array1<T>) {
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        *yi += alpha * *xi;
    }
}

/// `x *= alpha`
#[inline]
pub fn scale_inplace<T: ComplexField>(x: &mut Array1<T>, alpha: T) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// Block product with the conjugate transpose of the left factor: C = A^H * B
///
/// For a tall `A` (`N x k`) and `B` (`N x m`) this is the `k x m` matrix of
/// pairwise inner products between columns.
pub fn hermitian_product<T: ComplexField>(a: &Array2<T>, b: &Array2<T>) -> Array2<T> {
    assert_eq!(
        a.nrows(),
        b.nrows(),
        "Row counts must match for A^H * B"
    );

    let mut c = Array2::from_elem((a.ncols(), b.ncols()), T::zero());
    for i in 0..a.ncols() {
        for j in 0..b.ncols() {
            c[[i, j]] = inner_product(a.column(i), b.column(j));
        }
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use num_complex::Complex64;

    #[test]
    fn test_inner_product_complex() {
        let x = array![Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)];
        let y = array![Complex64::new(5.0, 6.0), Complex64::new(7.0, 8.0)];

        let ip = inner_product(x.view(), y.view());
        assert_relative_eq!(ip.re, 70.0, epsilon = 1e-10);
        assert_relative_eq!(ip.im, -8.0, epsilon = 1e-10);
    }

    #[test]
    fn test_vector_norm_complex() {
        let x = array![Complex64::new(3.0, 0.0), Complex64::new(0.0, 4.0)];

        assert_relative_eq!(vector_norm(x.view()), 5.0, epsilon = 1e-10);
        assert_relative_eq!(vector_norm_sqr(x.view()), 25.0, epsilon = 1e-10);
    }

    #[test]
    fn test_axpy_and_scale() {
        let x = array![1.0_f64, 2.0, 3.0];
        let mut y = array![1.0_f64, 1.0, 1.0];

        axpy(2.0, x.view(), &mut y);
        assert_relative_eq!(y[2], 7.0, epsilon = 1e-10);

        scale_inplace(&mut y, 0.5);
        assert_relative_eq!(y[0], 1.5, epsilon = 1e-10);
        assert_relative_eq!(y[1], 2.5, epsilon = 1e-10);
    }

    #[test]
    fn test_hermitian_product() {
        let a = array![
            [Complex64::new(0.0, 1.0), Complex64::new(1.0, 0.0)],
            [Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
        ];
        let b = array![[Complex64::new(2.0, 0.0)], [Complex64::new(5.0, 0.0)]];

        let c = hermitian_product(&a, &b);

        assert_eq!(c.dim(), (2, 1));
        // conj(i) * 2 = -2i
        assert_relative_eq!(c[[0, 0]].im, -2.0, epsilon = 1e-12);
        assert_relative_eq!(c[[1, 0]].re, 2.0, epsilon = 1e-12);
    }
}
