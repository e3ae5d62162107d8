//! Linear algebra substrate for spectral eigenvalue analysis
//!
//! The pieces of dense and sparse linear algebra needed around an external
//! eigenvalue solver: storage for assembled pencil matrices, direct
//! factorizations that are computed once and applied to blocks of
//! eigenvectors, and small dense kernels for reduced operators.
//!
//! # Features
//!
//! - **Sparse Matrices**: CSR format with mat-vec, block application and scaled addition
//! - **Direct Factorizations**: LU with partial pivoting, thin QR by modified Gram-Schmidt
//! - **Dense Kernels**: singular values of small complex matrices
//! - **Generic Scalar Types**: `Complex64` and `f64`
//!
//! # Example
//!
//! ```ignore
//! use math_eigen_solvers::{CsrMatrix, LuFactorization, thin_qr};
//!
//! let lu = LuFactorization::from_csr(&pre_right)?;
//! let v = lu.solve_block(&raw_eigenvectors)?;
//! let basis = thin_qr(&v)?.q;
//! ```

pub mod blas_helpers;
pub mod dense;
pub mod direct;
pub mod parallel;
pub mod sparse;
pub mod traits;

pub use sparse::CsrMatrix;
pub use traits::{ComplexField, LinearOperator};

pub use direct::{
    LuError, LuFactorization, QrError, QrFactorization, lu_factorize, thin_qr,
};

pub use dense::{max_singular_value, min_singular_value, singular_values};
