//! Error types for eigenvalue analysis.
//!
//! Two layers: [`SolveError`] is what a [`SpectralBackend`](crate::SpectralBackend)
//! reports when the external eigenvalue solve itself fails, and [`EigenError`]
//! covers everything this crate can reject (configuration, degenerate spectra,
//! linear algebra) and wraps solver failures.

use solvers::{LuError, QrError};
use thiserror::Error;

/// Failure of the external eigenvalue solve.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    /// The dense generalized eigenvalue solve failed.
    #[error("dense eigenvalue solve failed: {0}")]
    DenseFailure(String),

    /// The shift-invert iteration ran out of iterations.
    #[error("sparse eigenvalue solve did not converge: {converged} of {requested} eigenvalues")]
    SparseNoConvergence {
        /// Number of eigenvalues requested
        requested: usize,
        /// Number of eigenvalues that converged
        converged: usize,
    },

    /// The sparse solver reported an internal error.
    #[error("sparse eigenvalue solver error: {0}")]
    SparseInternal(String),

    /// The backend could not build the pencil matrices.
    #[error("failed to assemble pencil: {0}")]
    Assembly(String),
}

impl SolveError {
    /// Returns `true` for numerical failures of the solve itself.
    ///
    /// These are the failures a parameter sweep treats as a missing sample.
    /// Assembly failures are not included: they point at a broken problem
    /// definition rather than at an unlucky parameter point.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SolveError::DenseFailure(_)
                | SolveError::SparseNoConvergence { .. }
                | SolveError::SparseInternal(_)
        )
    }

    /// Returns `true` if the failure came from the sparse (shift-invert) path.
    pub fn is_sparse(&self) -> bool {
        matches!(
            self,
            SolveError::SparseNoConvergence { .. } | SolveError::SparseInternal(_)
        )
    }
}

/// Errors that can occur during eigenvalue analysis.
#[derive(Debug, Error)]
pub enum EigenError {
    /// A parameter override names a parameter the problem never declared.
    #[error("unknown parameter '{name}'")]
    UnknownParameter {
        /// The offending parameter name
        name: String,
    },

    /// The problem domain has no bases to scale.
    #[error("eigenvalue problem domain has no bases")]
    NoBases,

    /// Mode projection was given the wrong number of transverse modes.
    #[error(
        "must specify {expected} transverse modes for a domain with {bases} bases; {got} specified"
    )]
    TransverseModeMismatch {
        /// Required number of transverse modes
        expected: usize,
        /// Number of bases in the target domain
        bases: usize,
        /// Number of transverse modes supplied
        got: usize,
    },

    /// A spectrum selector other than `good`, `low` or `high`.
    #[error("spectrum type '{0}' is not one of {{low, high, good}}")]
    UnsupportedSpectrum(String),

    /// The requested pencil does not exist.
    #[error("pencil {pencil} out of range: problem has {count} pencils")]
    PencilOutOfRange {
        /// Requested pencil
        pencil: usize,
        /// Number of pencils available
        count: usize,
    },

    /// Invalid construction-time or solve-time option.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Coefficient data does not match the size of its basis.
    #[error("coefficient length mismatch: expected {expected}, got {got}")]
    CoefficientMismatch {
        /// Expected number of coefficients
        expected: usize,
        /// Number supplied
        got: usize,
    },

    /// Fewer than two finite low-resolution eigenvalues: spacing is undefined.
    #[error("not enough finite eigenvalues to compute spacing: found {found}, need at least 2")]
    InsufficientEigenvalues {
        /// Number of finite eigenvalues found
        found: usize,
    },

    /// Drift ratios or the high-resolution spectrum were requested without rejection.
    #[error("eigenvalue rejection is disabled")]
    RejectionDisabled,

    /// A mode index outside the available modes.
    #[error("mode index {index} out of range ({len} modes available)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of available modes
        len: usize,
    },

    /// Mode extraction from a solve that returned no eigenvectors.
    #[error("solver state holds no eigenvectors")]
    MissingEigenvectors,

    /// Eigenvector block and eigenvalue array disagree.
    #[error("solver returned {got} eigenvectors for {expected} eigenvalues")]
    EigenvectorMismatch {
        /// Number of eigenvalues
        expected: usize,
        /// Number of eigenvector columns
        got: usize,
    },

    /// Pencil matrices are not square or not all of the same size.
    #[error("pencil matrix {matrix} is {rows}x{cols}, expected {expected}x{expected}")]
    PencilShapeMismatch {
        /// Which matrix: `L`, `M` or `pre_right`
        matrix: &'static str,
        /// Rows of the offending matrix
        rows: usize,
        /// Columns of the offending matrix
        cols: usize,
        /// Size of `L`
        expected: usize,
    },

    /// Eigenvectors whose length differs from the pencil size.
    #[error("eigenvectors have {got} rows, pencil size is {expected}")]
    EigenvectorLengthMismatch {
        /// Size of the pencil
        expected: usize,
        /// Rows of the eigenvector block
        got: usize,
    },

    /// Factorization failure inside the pseudospectrum reduction.
    #[error("linear algebra failure: {0}")]
    LinearAlgebra(String),

    /// The external eigenvalue solve failed.
    #[error(transparent)]
    Solve(#[from] SolveError),

    /// Reading or writing a configuration file failed.
    #[error("configuration I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("configuration JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LuError> for EigenError {
    fn from(err: LuError) -> Self {
        EigenError::LinearAlgebra(err.to_string())
    }
}

impl From<QrError> for EigenError {
    fn from(err: QrError) -> Self {
        EigenError::LinearAlgebra(err.to_string())
    }
}

/// A specialized `Result` type for eigenvalue analysis.
pub type Result<T> = std::result::Result<T, EigenError>;

impl EigenError {
    /// Returns `true` if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EigenError::UnknownParameter { .. }
                | EigenError::NoBases
                | EigenError::TransverseModeMismatch { .. }
                | EigenError::UnsupportedSpectrum(_)
                | EigenError::PencilOutOfRange { .. }
                | EigenError::InvalidConfig(_)
                | EigenError::CoefficientMismatch { .. }
        )
    }

    /// Returns `true` if this wraps a recoverable solver failure.
    pub fn is_solver_failure(&self) -> bool {
        matches!(self, EigenError::Solve(err) if err.is_recoverable())
    }

    /// Returns `true` if the spectrum was too degenerate to analyse.
    pub fn is_degenerate_spectrum(&self) -> bool {
        matches!(self, EigenError::InsufficientEigenvalues { .. })
    }
}
