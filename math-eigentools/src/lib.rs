//! Spurious-eigenvalue rejection for spectral linear stability problems
//!
//! Spectral discretizations of a linearized PDE return, next to the
//! converged eigenvalues, spurious ones that are artefacts of truncation.
//! This crate solves the problem at two resolutions and keeps only the
//! eigenvalues that barely move between them, measured against the local
//! spacing of the spectrum.
//!
//! # Features
//!
//! - **Rejection**: nearest-match and same-rank drift ratios
//! - **Orchestration**: base and shadow problem kept in sync under parameter overrides
//! - **Growth rates**: fastest-growing mode with a NaN sentinel for failed solves
//! - **Pseudospectra**: resolvent norms of the operator projected on an invariant subspace
//! - **Pluggable solvers**: any discretization implementing [`SpectralBackend`]
//!
//! # Example
//!
//! ```ignore
//! use math_eigentools::{Eigenproblem, EigenproblemConfig, SolveRequest};
//!
//! let mut evp = Eigenproblem::with_config(backend, problem, EigenproblemConfig::default())?;
//! let analysis = evp.solve(&SolveRequest::dense().with_parameter("Ra", 1708.0))?;
//! println!("{} good eigenvalues", analysis.evalues().len());
//!
//! let rate = evp.growth_rate(&SolveRequest::dense().with_parameter("Ra", 2000.0))?;
//! ```

pub mod backend;
pub mod basis;
pub mod config;
pub mod diagnostics;
pub mod eigenproblem;
pub mod error;
pub mod field;
pub mod problem;
pub mod pseudospectrum;
pub mod reject;

pub use backend::{
    EigenPairs, PencilMatrices, SolveMode, SolverState, SparseOptions, SparseRequest,
    SpectralBackend, run,
};
pub use basis::{Basis, BasisKind};
pub use config::EigenproblemConfig;
pub use diagnostics::{DriftRatios, GrowthRate, SpectrumKind, fastest_growing};
pub use eigenproblem::{Analysis, Eigenproblem, Selector, SolveRequest, imag_part, real_part};
pub use error::{EigenError, Result, SolveError};
pub use field::{Field, FieldSystem, ProjectedField};
pub use problem::{Domain, EigenProblem, Parameter};
pub use pseudospectrum::{ComplexGrid, Pseudospectrum, ResolventNorm};
pub use reject::{IndexedEigenvalue, Rejection, reject_spurious};
