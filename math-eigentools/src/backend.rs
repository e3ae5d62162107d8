//! Seam to the external discretization and eigenvalue solver.
//!
//! A [`SpectralBackend`] turns an [`EigenProblem`] into pencil matrices and
//! solves them, densely or by shift-invert around a target. [`run`] drives
//! one solve and captures the outcome as an immutable [`SolverState`]
//! snapshot; nothing about a solve is kept inside the backend.

use crate::error::{EigenError, Result, SolveError};
use crate::field::FieldSystem;
use crate::problem::EigenProblem;
use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;
use solvers::CsrMatrix;

/// Assembled matrices of one pencil: `L x + lambda M x = 0`
#[derive(Debug, Clone)]
pub struct PencilMatrices {
    /// Stiffness part `L`
    pub l: CsrMatrix<Complex64>,
    /// Mass part `M`
    pub m: CsrMatrix<Complex64>,
    /// Right preconditioner mapping physical unknowns to solver unknowns
    pub pre_right: CsrMatrix<Complex64>,
}

impl PencilMatrices {
    pub fn dimension(&self) -> usize {
        self.l.num_rows
    }

    /// `A` of `A x = lambda E x`
    pub fn stiffness(&self) -> &CsrMatrix<Complex64> {
        &self.l
    }

    /// `E = -M` of `A x = lambda E x`
    pub fn mass(&self) -> CsrMatrix<Complex64> {
        self.m.negated()
    }

    /// All three matrices must be square and share the size of `L`.
    pub fn check_shapes(&self) -> Result<()> {
        let expected = self.l.num_rows;
        for (matrix, csr) in [("L", &self.l), ("M", &self.m), ("pre_right", &self.pre_right)] {
            if csr.num_rows != expected || csr.num_cols != expected {
                return Err(EigenError::PencilShapeMismatch {
                    matrix,
                    rows: csr.num_rows,
                    cols: csr.num_cols,
                    expected,
                });
            }
        }
        Ok(())
    }
}

/// Eigenvalues in solver order, with eigenvectors stored column-wise
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPairs {
    pub eigenvalues: Array1<Complex64>,
    pub eigenvectors: Option<Array2<Complex64>>,
}

impl EigenPairs {
    pub fn new(eigenvalues: Array1<Complex64>, eigenvectors: Option<Array2<Complex64>>) -> Self {
        Self {
            eigenvalues,
            eigenvectors,
        }
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }
}

/// Options forwarded untouched to the sparse solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseOptions {
    /// Relative accuracy of the Ritz values (0 = machine precision)
    pub tolerance: f64,
    /// Maximum number of restarts
    pub max_iterations: Option<usize>,
    /// Number of Lanczos/Arnoldi vectors
    pub krylov_dim: Option<usize>,
}

impl Default for SparseOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.0,
            max_iterations: None,
            krylov_dim: None,
        }
    }
}

/// Shift-invert solve for `mode_count` eigenvalues nearest `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseRequest {
    pub mode_count: usize,
    pub target: Complex64,
    pub options: SparseOptions,
}

impl SparseRequest {
    pub fn new(mode_count: usize, target: Complex64) -> Self {
        Self {
            mode_count,
            target,
            options: SparseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SparseOptions) -> Self {
        self.options = options;
        self
    }
}

/// How a pencil is solved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveMode {
    /// All eigenvalues
    Dense,
    /// A few eigenvalues around a target
    Sparse(SparseRequest),
}

impl SolveMode {
    pub fn label(&self) -> &'static str {
        match self {
            SolveMode::Dense => "dense",
            SolveMode::Sparse(_) => "sparse",
        }
    }
}

/// Interface to a spectral discretization and its eigenvalue solvers
pub trait SpectralBackend {
    /// Number of independent pencils (blocks) of the discretized system
    fn num_pencils(&self, problem: &EigenProblem) -> usize;

    /// Build the pencil matrices from the current parameter values
    fn assemble(
        &self,
        problem: &EigenProblem,
        pencil: usize,
    ) -> std::result::Result<PencilMatrices, SolveError>;

    /// All eigenpairs of a pencil
    fn solve_dense(
        &self,
        matrices: &PencilMatrices,
    ) -> std::result::Result<EigenPairs, SolveError>;

    /// A subset of eigenpairs by shift-invert
    fn solve_sparse(
        &self,
        matrices: &PencilMatrices,
        request: &SparseRequest,
    ) -> std::result::Result<EigenPairs, SolveError>;

    /// Split a solver eigenvector into one field per problem variable
    fn unpack_state(
        &self,
        problem: &EigenProblem,
        eigenvector: ArrayView1<Complex64>,
    ) -> std::result::Result<FieldSystem, SolveError>;
}

/// Outcome of one eigenvalue solve
#[derive(Debug, Clone)]
pub struct SolverState {
    pub pencil: usize,
    pub mode: SolveMode,
    matrices: PencilMatrices,
    pairs: EigenPairs,
}

impl SolverState {
    /// Eigenvalues in solver order
    pub fn eigenvalues(&self) -> &Array1<Complex64> {
        &self.pairs.eigenvalues
    }

    pub fn eigenvectors(&self) -> Option<&Array2<Complex64>> {
        self.pairs.eigenvectors.as_ref()
    }

    /// Eigenvector of the `index`-th eigenvalue in solver order
    pub fn eigenvector(&self, index: usize) -> Result<ArrayView1<'_, Complex64>> {
        let vectors = self
            .pairs
            .eigenvectors
            .as_ref()
            .ok_or(EigenError::MissingEigenvectors)?;
        if index >= vectors.ncols() {
            return Err(EigenError::IndexOutOfRange {
                index,
                len: vectors.ncols(),
            });
        }
        Ok(vectors.column(index))
    }

    pub fn matrices(&self) -> &PencilMatrices {
        &self.matrices
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Assemble and solve one pencil of `problem`.
///
/// The matrices are rebuilt on every call so parameter overrides made since
/// the previous solve are always picked up. A sparse solve that returns
/// fewer eigenvalues than requested is reported as non-convergence.
pub fn run<B: SpectralBackend + ?Sized>(
    backend: &B,
    problem: &EigenProblem,
    pencil: usize,
    mode: SolveMode,
) -> Result<SolverState> {
    let count = backend.num_pencils(problem);
    if pencil >= count {
        return Err(EigenError::PencilOutOfRange { pencil, count });
    }

    let matrices = backend.assemble(problem, pencil)?;
    matrices.check_shapes()?;

    let pairs = match &mode {
        SolveMode::Dense => backend.solve_dense(&matrices)?,
        SolveMode::Sparse(request) => {
            if request.mode_count == 0 {
                return Err(EigenError::InvalidConfig(
                    "sparse solve needs a positive mode count".into(),
                ));
            }
            let pairs = backend.solve_sparse(&matrices, request)?;
            if pairs.len() < request.mode_count {
                return Err(SolveError::SparseNoConvergence {
                    requested: request.mode_count,
                    converged: pairs.len(),
                }
                .into());
            }
            pairs
        }
    };

    if let Some(vectors) = &pairs.eigenvectors {
        if vectors.ncols() != pairs.len() {
            return Err(EigenError::EigenvectorMismatch {
                expected: pairs.len(),
                got: vectors.ncols(),
            });
        }
        if vectors.nrows() != matrices.dimension() {
            return Err(EigenError::EigenvectorLengthMismatch {
                expected: matrices.dimension(),
                got: vectors.nrows(),
            });
        }
    }

    log::debug!(
        "Solved pencil {} ({}, n = {}): {} eigenvalues",
        pencil,
        mode.label(),
        matrices.dimension(),
        pairs.len()
    );

    Ok(SolverState {
        pencil,
        mode,
        matrices,
        pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::Basis;
    use crate::problem::Domain;
    use ndarray::array;

    /// Diagonal pencil `diag(d) x = lambda x`
    struct Diagonal {
        d: Array1<Complex64>,
        pencils: usize,
        converged: Option<usize>,
        pre_right_size: Option<usize>,
        vector_rows: Option<usize>,
    }

    impl Diagonal {
        fn new(d: Vec<f64>) -> Self {
            Self {
                d: d.into_iter().map(|x| Complex64::new(x, 0.0)).collect(),
                pencils: 1,
                converged: None,
                pre_right_size: None,
                vector_rows: None,
            }
        }
    }

    impl SpectralBackend for Diagonal {
        fn num_pencils(&self, _problem: &EigenProblem) -> usize {
            self.pencils
        }

        fn assemble(
            &self,
            _problem: &EigenProblem,
            _pencil: usize,
        ) -> std::result::Result<PencilMatrices, SolveError> {
            let n = self.d.len();
            Ok(PencilMatrices {
                l: CsrMatrix::from_diagonal(&self.d),
                m: CsrMatrix::identity(n).negated(),
                pre_right: CsrMatrix::identity(self.pre_right_size.unwrap_or(n)),
            })
        }

        fn solve_dense(
            &self,
            matrices: &PencilMatrices,
        ) -> std::result::Result<EigenPairs, SolveError> {
            let n = matrices.dimension();
            let values = Array1::from_iter((0..n).map(|i| matrices.l.get(i, i)));
            let vectors = match self.vector_rows {
                Some(rows) => Array2::zeros((rows, n)),
                None => Array2::eye(n),
            };
            Ok(EigenPairs::new(values, Some(vectors)))
        }

        fn solve_sparse(
            &self,
            matrices: &PencilMatrices,
            request: &SparseRequest,
        ) -> std::result::Result<EigenPairs, SolveError> {
            let all = self.solve_dense(matrices)?;
            let k = self.converged.unwrap_or(request.mode_count);
            let values = all.eigenvalues.slice(ndarray::s![..k]).to_owned();
            Ok(EigenPairs::new(values, None))
        }

        fn unpack_state(
            &self,
            _problem: &EigenProblem,
            _eigenvector: ArrayView1<Complex64>,
        ) -> std::result::Result<FieldSystem, SolveError> {
            Ok(FieldSystem::default())
        }
    }

    fn problem() -> EigenProblem {
        let z = Basis::chebyshev("z", 3, (0.0, 1.0));
        EigenProblem::new(Domain::new(vec![z]), ["u"], "lambda")
    }

    #[test]
    fn test_dense_run() {
        let backend = Diagonal::new(vec![3.0, 1.0, 2.0]);
        let state = run(&backend, &problem(), 0, SolveMode::Dense).unwrap();

        assert_eq!(state.len(), 3);
        assert_eq!(state.eigenvalues()[1], Complex64::new(1.0, 0.0));
        assert_eq!(
            state.eigenvector(2).unwrap().to_vec(),
            vec![
                Complex64::new(0.0, 0.0),
                Complex64::new(0.0, 0.0),
                Complex64::new(1.0, 0.0)
            ]
        );
        assert!(matches!(
            state.eigenvector(3),
            Err(EigenError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_mass_is_negated() {
        let backend = Diagonal::new(vec![1.0, 2.0]);
        let state = run(&backend, &problem(), 0, SolveMode::Dense).unwrap();
        let e = state.matrices().mass();
        assert_eq!(e.get(0, 0), Complex64::new(1.0, 0.0));
        assert_eq!(state.matrices().stiffness().get(1, 1), Complex64::new(2.0, 0.0));
    }

    #[test]
    fn test_mismatched_preconditioner_rejected() {
        let mut backend = Diagonal::new(vec![1.0, 2.0, 3.0]);
        backend.pre_right_size = Some(2);

        let err = run(&backend, &problem(), 0, SolveMode::Dense).unwrap_err();
        assert!(matches!(
            err,
            EigenError::PencilShapeMismatch {
                matrix: "pre_right",
                rows: 2,
                cols: 2,
                expected: 3
            }
        ));
        assert_eq!(
            err.to_string(),
            "pencil matrix pre_right is 2x2, expected 3x3"
        );
    }

    #[test]
    fn test_short_eigenvectors_rejected() {
        let mut backend = Diagonal::new(vec![1.0, 2.0, 3.0]);
        backend.vector_rows = Some(2);

        let err = run(&backend, &problem(), 0, SolveMode::Dense).unwrap_err();
        assert!(matches!(
            err,
            EigenError::EigenvectorLengthMismatch { expected: 3, got: 2 }
        ));
    }

    #[test]
    fn test_pencil_out_of_range() {
        let backend = Diagonal::new(vec![1.0, 2.0]);
        let err = run(&backend, &problem(), 1, SolveMode::Dense).unwrap_err();
        assert!(matches!(
            err,
            EigenError::PencilOutOfRange { pencil: 1, count: 1 }
        ));
    }

    #[test]
    fn test_sparse_short_return_is_non_convergence() {
        let mut backend = Diagonal::new(vec![1.0, 2.0, 3.0]);
        backend.converged = Some(1);
        let mode = SolveMode::Sparse(SparseRequest::new(2, Complex64::new(0.0, 0.0)));

        let err = run(&backend, &problem(), 0, mode).unwrap_err();
        assert!(err.is_solver_failure());
        assert!(matches!(
            err,
            EigenError::Solve(SolveError::SparseNoConvergence {
                requested: 2,
                converged: 1
            })
        ));
    }

    #[test]
    fn test_sparse_without_vectors() {
        let backend = Diagonal::new(vec![1.0, 2.0, 3.0]);
        let mode = SolveMode::Sparse(SparseRequest::new(2, Complex64::new(0.0, 0.0)));

        let state = run(&backend, &problem(), 0, mode).unwrap();
        assert_eq!(state.eigenvalues(), &array![Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)]);
        assert!(matches!(
            state.eigenvector(0),
            Err(EigenError::MissingEigenvectors)
        ));
    }

    #[test]
    fn test_zero_mode_count_rejected() {
        let backend = Diagonal::new(vec![1.0]);
        let mode = SolveMode::Sparse(SparseRequest::new(0, Complex64::new(0.0, 0.0)));
        let err = run(&backend, &problem(), 0, mode).unwrap_err();
        assert!(err.is_config_error());
    }
}
