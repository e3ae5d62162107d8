//! Scalar and operator abstractions shared by the factorizations

use ndarray::{Array1, Array2, Axis};
use num_complex::Complex64;
use num_traits::{Float, FromPrimitive, NumAssign, One, ToPrimitive, Zero};
use std::fmt::Debug;
use std::ops::Neg;

/// Trait for scalar types that can be used in the pencil operations.
///
/// Pencils assembled by a spectral discretization are complex in general
/// (Fourier directions contribute `i k` factors), so `Complex64` is the
/// main instantiation. `f64` is kept for real-valued test problems.
pub trait ComplexField:
    NumAssign + Clone + Copy + Send + Sync + Debug + Zero + One + Neg<Output = Self> + 'static
{
    /// Magnitudes live here
    type Real: Float + NumAssign + FromPrimitive + ToPrimitive + Send + Sync + Debug + 'static;

    /// Complex conjugate
    fn conj(&self) -> Self;

    /// Squared magnitude |z|²
    fn norm_sqr(&self) -> Self::Real;

    /// Magnitude |z|
    fn norm(&self) -> Self::Real {
        self.norm_sqr().sqrt()
    }

    /// Embed a real number
    fn from_real(r: Self::Real) -> Self;

    /// Real part
    fn re(&self) -> Self::Real;

    /// Imaginary part
    fn im(&self) -> Self::Real;

    /// Both parts are finite (neither NaN nor infinite)
    fn is_finite(&self) -> bool {
        self.re().is_finite() && self.im().is_finite()
    }

    /// `1 / z`
    fn inv(&self) -> Self;
}

impl ComplexField for Complex64 {
    type Real = f64;

    #[inline]
    fn conj(&self) -> Self {
        Complex64::conj(self)
    }

    #[inline]
    fn norm_sqr(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    #[inline]
    fn from_real(r: f64) -> Self {
        Complex64::new(r, 0.0)
    }

    #[inline]
    fn re(&self) -> f64 {
        self.re
    }

    #[inline]
    fn im(&self) -> f64 {
        self.im
    }

    #[inline]
    fn inv(&self) -> Self {
        let denom = self.norm_sqr();
        Complex64::new(self.re / denom, -self.im / denom)
    }
}

impl ComplexField for f64 {
    type Real = f64;

    #[inline]
    fn conj(&self) -> Self {
        *self
    }

    #[inline]
    fn norm_sqr(&self) -> f64 {
        *self * *self
    }

    #[inline]
    fn from_real(r: f64) -> Self {
        r
    }

    #[inline]
    fn re(&self) -> f64 {
        *self
    }

    #[inline]
    fn im(&self) -> f64 {
        0.0
    }

    #[inline]
    fn inv(&self) -> Self {
        1.0 / *self
    }
}

/// Anything that maps vectors of length `num_cols` to length `num_rows`
pub trait LinearOperator<T: ComplexField>: Send + Sync {
    fn num_rows(&self) -> usize;

    fn num_cols(&self) -> usize;

    /// `y = A x`
    fn apply(&self, x: &Array1<T>) -> Array1<T>;

    /// `Y = A X`, one column at a time
    fn apply_block(&self, x: &Array2<T>) -> Array2<T> {
        assert_eq!(x.nrows(), self.num_cols(), "Input block size mismatch");

        let mut y = Array2::from_elem((self.num_rows(), x.ncols()), T::zero());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let yj = self.apply(&column.to_owned());
            y.column_mut(j).assign(&yj);
        }
        y
    }
}
