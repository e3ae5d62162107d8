//! Coefficient-space fields.
//!
//! Spatially varying parameters (non-constant coefficients) and mode shapes
//! are held as spectral coefficients on a [`Basis`]. Moving a field to a
//! different resolution is then a matter of padding or truncating its
//! coefficients, which reproduces the same function on the new grid.

use crate::basis::{Basis, BasisKind};
use crate::error::{EigenError, Result};
use ndarray::{Array1, ArrayView1, ArrayD};
use num_complex::Complex64;

/// A named field stored by its spectral coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    basis: Basis,
    coeffs: Array1<Complex64>,
}

impl Field {
    /// Zero field on a basis
    pub fn zeros(name: impl Into<String>, basis: Basis) -> Self {
        let coeffs = Array1::zeros(basis.size);
        Self {
            name: name.into(),
            basis,
            coeffs,
        }
    }

    /// Field from explicit coefficients
    ///
    /// Fourier coefficients are in native order: non-negative wavenumbers
    /// first, then the negative ones.
    pub fn from_coefficients(
        name: impl Into<String>,
        basis: Basis,
        coeffs: Array1<Complex64>,
    ) -> Result<Self> {
        if coeffs.len() != basis.size {
            return Err(EigenError::CoefficientMismatch {
                expected: basis.size,
                got: coeffs.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            basis,
            coeffs,
        })
    }

    /// Basis the coefficients refer to
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// Spectral coefficients
    pub fn coefficients(&self) -> ArrayView1<'_, Complex64> {
        self.coeffs.view()
    }

    /// Number of coefficients
    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    /// True for a field with no coefficients
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// The same field represented on another basis of the same family.
    ///
    /// The result owns fresh storage; later changes to either field do not
    /// affect the other.
    pub fn resample(&self, basis: &Basis) -> Field {
        let coeffs = match self.basis.kind {
            BasisKind::Fourier => resize_fourier(self.coeffs.view(), basis.size),
            BasisKind::Chebyshev | BasisKind::Legendre => {
                resize_polynomial(self.coeffs.view(), basis.size)
            }
        };
        Field {
            name: self.name.clone(),
            basis: basis.clone(),
            coeffs,
        }
    }
}

/// Pad with trailing zeros or drop the highest modes
fn resize_polynomial(coeffs: ArrayView1<Complex64>, size: usize) -> Array1<Complex64> {
    let mut out = Array1::zeros(size);
    let keep = coeffs.len().min(size);
    out.slice_mut(ndarray::s![..keep])
        .assign(&coeffs.slice(ndarray::s![..keep]));
    out
}

/// Native Fourier order `[0, 1, .., k_max, -k_max', .., -1]`: zeros go in the middle
fn resize_fourier(coeffs: ArrayView1<Complex64>, size: usize) -> Array1<Complex64> {
    let n = coeffs.len();
    let mut out = Array1::zeros(size);

    let pos_src = n.div_ceil(2);
    let neg_src = n - pos_src;
    let pos_dst = size.div_ceil(2);
    let neg_dst = size - pos_dst;

    let pos = pos_src.min(pos_dst);
    let neg = neg_src.min(neg_dst);

    for k in 0..pos {
        out[k] = coeffs[k];
    }
    for k in 1..=neg {
        out[size - k] = coeffs[n - k];
    }
    out
}

/// The fields of one eigenmode, one per problem variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSystem {
    pub fields: Vec<Field>,
}

impl FieldSystem {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

/// A mode embedded into a multi-dimensional domain
///
/// `coeffs` has one axis per domain basis; the mode's coefficients occupy
/// the last axis at the fixed transverse mode numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedField {
    pub name: String,
    pub coeffs: ArrayD<Complex64>,
}
