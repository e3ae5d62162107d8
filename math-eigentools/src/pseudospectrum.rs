//! Pseudospectra from a projected invariant subspace.
//!
//! A few eigenvectors around a shift `mu` span an invariant subspace of the
//! pencil `A x = lambda E x`. Projecting the shift-inverted operator onto an
//! orthonormal basis `Q` of that subspace gives a small `k x k` matrix
//!
//! ```text
//! Ghat = Q^H (A - mu E)^-1 E Q,      Gmu = Ghat^-1 + mu I
//! ```
//!
//! whose eigenvalues approximate the `k` eigenvalues nearest `mu`. The
//! resolvent of `Gmu` is then cheap to evaluate over a grid of complex points.

use crate::backend::{SolveMode, SolverState, SparseRequest, SpectralBackend, run};
use crate::eigenproblem::Eigenproblem;
use crate::error::{EigenError, Result};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use solvers::blas_helpers::hermitian_product;
use solvers::parallel::parallel_map_indexed;
use solvers::{LinearOperator, LuFactorization, lu_factorize, thin_qr};
use solvers::{max_singular_value, min_singular_value};

/// Cartesian grid of complex points
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexGrid {
    /// Real parts, one per column
    pub real: Array1<f64>,
    /// Imaginary parts, one per row
    pub imag: Array1<f64>,
}

impl ComplexGrid {
    pub fn new(real: Array1<f64>, imag: Array1<f64>) -> Self {
        Self { real, imag }
    }

    /// Evenly spaced points, end points included
    pub fn linspace(real: (f64, f64), nreal: usize, imag: (f64, f64), nimag: usize) -> Self {
        Self {
            real: Array1::linspace(real.0, real.1, nreal),
            imag: Array1::linspace(imag.0, imag.1, nimag),
        }
    }

    /// `(rows, cols)` = `(imag.len(), real.len())`
    pub fn shape(&self) -> (usize, usize) {
        (self.imag.len(), self.real.len())
    }

    /// Point at `row` (imaginary index) and `col` (real index)
    pub fn point(&self, row: usize, col: usize) -> Complex64 {
        Complex64::new(self.real[col], self.imag[row])
    }
}

/// Norm evaluated at each grid point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolventNorm {
    /// `sigma_min(z I - Gmu)`, equal to `1 / ||(z I - Gmu)^-1||_2`
    #[default]
    MinSingular,
    /// `||z I - Gmu||_2`
    MaxSingular,
}

/// Pseudospectrum over a [`ComplexGrid`]
#[derive(Debug, Clone)]
pub struct Pseudospectrum {
    /// Norm values, rows follow `imag` and columns follow `real`
    pub values: Array2<f64>,
    pub real: Array1<f64>,
    pub imag: Array1<f64>,
    /// The `k x k` operator `Gmu`
    pub reduced_operator: Array2<Complex64>,
    pub norm: ResolventNorm,
}

impl Pseudospectrum {
    /// Elementwise reciprocal of `values`.
    ///
    /// For [`ResolventNorm::MinSingular`] this is `||(z I - Gmu)^-1||_2`;
    /// epsilon-pseudospectra are its level sets at `1 / eps`.
    pub fn resolvent_norm(&self) -> Array2<f64> {
        self.values.mapv(f64::recip)
    }
}

/// Reduced operator `Gmu` of a solve that kept its eigenvectors
pub fn reduced_operator(state: &SolverState, mu: Complex64) -> Result<Array2<Complex64>> {
    let vectors = state.eigenvectors().ok_or(EigenError::MissingEigenvectors)?;
    let matrices = state.matrices();

    // Solver unknowns back to the physical basis
    let pre_right = LuFactorization::from_csr(&matrices.pre_right)?;
    let v = pre_right.solve_block(vectors)?;
    let q = thin_qr(&v)?.q;

    let a = matrices.stiffness();
    let e = matrices.mass();
    let shifted = LuFactorization::from_csr(&a.add_scaled(-mu, &e))?;

    let g_hat = hermitian_product(&q, &shifted.solve_block(&e.apply_block(&q))?);

    let k = g_hat.nrows();
    let mut g_mu = lu_factorize(&g_hat)?.inverse()?;
    for i in 0..k {
        g_mu[[i, i]] += mu;
    }
    Ok(g_mu)
}

/// `norm(z I - g)` at every grid point
///
/// Rows are independent and evaluated with [`parallel_map_indexed`].
pub fn resolvent_grid(
    g: &Array2<Complex64>,
    grid: &ComplexGrid,
    norm: ResolventNorm,
) -> Array2<f64> {
    let (rows, cols) = grid.shape();
    let k = g.nrows();

    let computed = parallel_map_indexed(rows, |j| {
        (0..cols)
            .map(|i| {
                let z = grid.point(j, i);
                let mut shifted = g.mapv(|v| -v);
                for d in 0..k {
                    shifted[[d, d]] += z;
                }
                match norm {
                    ResolventNorm::MinSingular => min_singular_value(&shifted),
                    ResolventNorm::MaxSingular => max_singular_value(&shifted),
                }
            })
            .collect::<Array1<f64>>()
    });

    let mut values = Array2::zeros((rows, cols));
    for (j, row) in computed.iter().enumerate() {
        values.row_mut(j).assign(row);
    }
    values
}

impl<B: SpectralBackend> Eigenproblem<B> {
    /// Pseudospectrum from `k` eigenmodes around `mu`
    ///
    /// Only the base-resolution problem is solved (pencil 0), whether or not
    /// rejection is enabled.
    pub fn pseudospectrum(
        &self,
        k: usize,
        grid: &ComplexGrid,
        mu: Complex64,
    ) -> Result<Pseudospectrum> {
        self.pseudospectrum_with_norm(k, grid, mu, ResolventNorm::default())
    }

    /// Pseudospectrum with an explicit choice of norm
    pub fn pseudospectrum_with_norm(
        &self,
        k: usize,
        grid: &ComplexGrid,
        mu: Complex64,
        norm: ResolventNorm,
    ) -> Result<Pseudospectrum> {
        if k == 0 {
            return Err(EigenError::InvalidConfig(
                "pseudospectrum needs at least one eigenmode".into(),
            ));
        }

        let mode = SolveMode::Sparse(SparseRequest::new(k, mu));
        let state = run(self.backend(), self.problem(), 0, mode)?;
        let reduced = reduced_operator(&state, mu)?;

        log::debug!(
            "Pseudospectrum: k = {}, mu = {}, {}x{} grid",
            k,
            mu,
            grid.imag.len(),
            grid.real.len()
        );

        Ok(Pseudospectrum {
            values: resolvent_grid(&reduced, grid, norm),
            real: grid.real.clone(),
            imag: grid.imag.clone(),
            reduced_operator: reduced,
            norm,
        })
    }
}
