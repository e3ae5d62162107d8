//! Dual-resolution eigenvalue analysis.
//!
//! [`Eigenproblem`] wraps a problem and a backend. With rejection enabled it
//! builds a finer shadow copy of the problem once, solves both on every
//! [`solve`](Eigenproblem::solve) and keeps only the eigenvalues that agree
//! between the two. Each solve returns a fresh [`Analysis`]; nothing from an
//! earlier solve is modified.

use crate::backend::{SolveMode, SolverState, SparseOptions, SparseRequest, SpectralBackend, run};
use crate::config::EigenproblemConfig;
use crate::diagnostics::{GrowthRate, fastest_growing};
use crate::error::{EigenError, Result};
use crate::field::{FieldSystem, ProjectedField};
use crate::problem::{Domain, EigenProblem, Parameter};
use crate::reject::{Rejection, reject_spurious};
use ndarray::{Array1, ArrayD, Axis, IxDyn};
use num_complex::Complex64;

/// Scalar score of an eigenvalue
pub type Selector = fn(Complex64) -> f64;

/// Default growth selector
pub fn real_part(z: Complex64) -> f64 {
    z.re
}

/// Default frequency selector
pub fn imag_part(z: Complex64) -> f64 {
    z.im
}

/// Options of one solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolveRequest {
    /// Shift-invert for a few modes instead of a dense solve
    pub sparse: bool,
    /// Parameter overrides applied before solving
    pub parameters: Vec<(String, Parameter)>,
    /// Block of the discretized system to solve
    pub pencil: usize,
    /// Number of eigenvalues (sparse only)
    pub mode_count: usize,
    /// Shift (sparse only)
    pub target: Complex64,
    /// Passed through to the sparse solver
    pub options: SparseOptions,
}

impl Default for SolveRequest {
    fn default() -> Self {
        Self {
            sparse: false,
            parameters: Vec::new(),
            pencil: 0,
            mode_count: 15,
            target: Complex64::new(0.0, 0.0),
            options: SparseOptions::default(),
        }
    }
}

impl SolveRequest {
    /// Dense solve of pencil 0
    pub fn dense() -> Self {
        Self::default()
    }

    /// Shift-invert solve for `mode_count` eigenvalues near `target`
    pub fn sparse(mode_count: usize, target: Complex64) -> Self {
        Self {
            sparse: true,
            mode_count,
            target,
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Parameter>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    pub fn with_pencil(mut self, pencil: usize) -> Self {
        self.pencil = pencil;
        self
    }

    pub fn with_options(mut self, options: SparseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mode(&self) -> SolveMode {
        if self.sparse {
            SolveMode::Sparse(
                SparseRequest::new(self.mode_count, self.target).with_options(self.options),
            )
        } else {
            SolveMode::Dense
        }
    }
}

/// Snapshot of one dual-resolution solve
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Base-resolution solve; the one modes are extracted from
    pub low: SolverState,
    /// Shadow solve, present when rejecting
    pub high: Option<SolverState>,
    /// Delta-test details, present when rejecting
    pub rejection: Option<Rejection>,
    accepted: Array1<Complex64>,
    indices: Vec<usize>,
}

impl Analysis {
    /// Base-resolution eigenvalues in solver order
    pub fn evalues_low(&self) -> &Array1<Complex64> {
        self.low.eigenvalues()
    }

    /// Shadow eigenvalues in solver order
    pub fn evalues_high(&self) -> Option<&Array1<Complex64>> {
        self.high.as_ref().map(SolverState::eigenvalues)
    }

    /// Accepted eigenvalues
    pub fn evalues(&self) -> &Array1<Complex64> {
        &self.accepted
    }

    /// Position of each accepted eigenvalue in the base-resolution output
    pub fn accepted_indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn is_rejecting(&self) -> bool {
        self.rejection.is_some()
    }

    /// Map a mode index to a column of the base-resolution solve.
    ///
    /// With `all_modes` the index already addresses the raw solver output;
    /// otherwise it addresses the accepted set.
    pub fn solver_index(&self, index: usize, all_modes: bool) -> Result<usize> {
        if all_modes {
            if index >= self.low.len() {
                return Err(EigenError::IndexOutOfRange {
                    index,
                    len: self.low.len(),
                });
            }
            return Ok(index);
        }
        self.indices
            .get(index)
            .copied()
            .ok_or(EigenError::IndexOutOfRange {
                index,
                len: self.indices.len(),
            })
    }

    /// Fastest-growing accepted mode, `None` when nothing was accepted
    pub fn fastest_growing(&self, grow_func: Selector, freq_func: Selector) -> Option<GrowthRate> {
        fastest_growing(self.accepted.view(), grow_func, freq_func)
    }
}

/// A problem solved at two resolutions with spurious eigenvalues removed
pub struct Eigenproblem<B: SpectralBackend> {
    backend: B,
    problem: EigenProblem,
    shadow: Option<EigenProblem>,
    config: EigenproblemConfig,
    grow_func: Selector,
    freq_func: Selector,
}

impl<B: SpectralBackend> Eigenproblem<B> {
    /// Analysis with default options (rejection on, factor 1.5)
    pub fn new(backend: B, problem: EigenProblem) -> Result<Self> {
        Self::with_config(backend, problem, EigenproblemConfig::default())
    }

    /// Builds the shadow problem up front when rejection is enabled
    pub fn with_config(
        backend: B,
        problem: EigenProblem,
        config: EigenproblemConfig,
    ) -> Result<Self> {
        config.validate()?;

        let shadow = if config.reject {
            let shadow = problem.shadow(config.factor)?;
            log::info!(
                "Shadow problem on '{}': {} -> {} modes",
                shadow.basis()?.name,
                problem.basis()?.size,
                shadow.basis()?.size
            );
            Some(shadow)
        } else {
            None
        };

        Ok(Self {
            backend,
            problem,
            shadow,
            config,
            grow_func: real_part,
            freq_func: imag_part,
        })
    }

    /// Replace the growth and frequency selectors
    pub fn with_selectors(mut self, grow_func: Selector, freq_func: Selector) -> Self {
        self.grow_func = grow_func;
        self.freq_func = freq_func;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Base-resolution problem
    pub fn problem(&self) -> &EigenProblem {
        &self.problem
    }

    /// Higher-resolution copy, when rejecting
    pub fn shadow(&self) -> Option<&EigenProblem> {
        self.shadow.as_ref()
    }

    pub fn config(&self) -> &EigenproblemConfig {
        &self.config
    }

    /// Collocation grid of the base problem
    pub fn grid(&self) -> Result<Array1<f64>> {
        self.grid_at(self.config.scales)
    }

    /// Collocation grid of the base problem at an explicit scale
    pub fn grid_at(&self, scales: f64) -> Result<Array1<f64>> {
        if !(scales.is_finite() && scales > 0.0) {
            return Err(EigenError::InvalidConfig(format!(
                "grid scale must be positive, got {}",
                scales
            )));
        }
        Ok(self.problem.basis()?.grid(scales))
    }

    /// Coordinate name of the base problem
    pub fn grid_name(&self) -> Result<&str> {
        Ok(&self.problem.basis()?.name)
    }

    /// Apply parameter overrides to the problem and its shadow.
    ///
    /// Every name is checked before anything is changed, so an unknown name
    /// leaves both problems untouched.
    pub fn set_parameters(&mut self, parameters: &[(String, Parameter)]) -> Result<()> {
        if let Some((name, _)) = parameters
            .iter()
            .find(|(name, _)| !self.problem.has_parameter(name))
        {
            return Err(EigenError::UnknownParameter { name: name.clone() });
        }

        for (name, value) in parameters {
            if let Some(shadow) = self.shadow.as_mut() {
                let basis = shadow.basis()?.clone();
                shadow.update_parameter(name, value.at_resolution(&basis))?;
            }
            self.problem.update_parameter(name, value.clone())?;
        }
        Ok(())
    }

    /// Solve at both resolutions and keep the eigenvalues that agree.
    ///
    /// Solver failures propagate.
    pub fn solve(&mut self, request: &SolveRequest) -> Result<Analysis> {
        self.set_parameters(&request.parameters)?;
        let mode = request.mode();

        let low = run(&self.backend, &self.problem, request.pencil, mode)?;

        let Some(shadow) = self.shadow.as_ref() else {
            let accepted = low.eigenvalues().clone();
            let indices = (0..accepted.len()).collect();
            return Ok(Analysis {
                low,
                high: None,
                rejection: None,
                accepted,
                indices,
            });
        };

        let high = run(&self.backend, shadow, request.pencil, mode)?;
        let rejection = reject_spurious(
            low.eigenvalues().view(),
            high.eigenvalues().view(),
            self.config.use_ordinal,
            self.config.drift_threshold,
        )?;

        Ok(Analysis {
            accepted: rejection.eigenvalues(),
            indices: rejection.indices(),
            low,
            high: Some(high),
            rejection: Some(rejection),
        })
    }

    /// Fields of one mode of `analysis`
    pub fn eigenmode(
        &self,
        analysis: &Analysis,
        index: usize,
        all_modes: bool,
    ) -> Result<FieldSystem> {
        let column = analysis.solver_index(index, all_modes)?;
        let vector = analysis.low.eigenvector(column)?;
        Ok(self.backend.unpack_state(&self.problem, vector)?)
    }

    /// A mode together with the grid it is meant to be shown on.
    ///
    /// `scales` overrides the configured grid scale for this call only.
    pub fn eigenmode_on_grid(
        &self,
        analysis: &Analysis,
        index: usize,
        scales: Option<f64>,
        all_modes: bool,
    ) -> Result<(Array1<f64>, FieldSystem)> {
        let grid = self.grid_at(scales.unwrap_or(self.config.scales))?;
        let fields = self.eigenmode(analysis, index, all_modes)?;
        Ok((grid, fields))
    }

    /// Embed a mode into a domain with extra transverse directions.
    ///
    /// One transverse mode number is needed per extra basis; each variable's
    /// coefficients land along the last axis at those mode numbers.
    pub fn project_mode(
        &self,
        analysis: &Analysis,
        index: usize,
        domain: &Domain,
        transverse_modes: &[usize],
        all_modes: bool,
    ) -> Result<Vec<ProjectedField>> {
        let bases = domain.dim();
        if bases == 0 {
            return Err(EigenError::NoBases);
        }
        if transverse_modes.len() != bases - 1 {
            return Err(EigenError::TransverseModeMismatch {
                expected: bases - 1,
                bases,
                got: transverse_modes.len(),
            });
        }

        let shape = domain.shape();
        for (&mode, &size) in transverse_modes.iter().zip(&shape) {
            if mode >= size {
                return Err(EigenError::IndexOutOfRange {
                    index: mode,
                    len: size,
                });
            }
        }
        let line = shape[bases - 1];

        let fields = self.eigenmode(analysis, index, all_modes)?;
        fields
            .iter()
            .map(|field| {
                if field.len() != line {
                    return Err(EigenError::CoefficientMismatch {
                        expected: line,
                        got: field.len(),
                    });
                }
                let mut coeffs = ArrayD::zeros(IxDyn(&shape));
                let mut view = coeffs.view_mut();
                for &mode in transverse_modes {
                    view = view.index_axis_move(Axis(0), mode);
                }
                view.assign(&field.coefficients());
                Ok(ProjectedField {
                    name: field.name.clone(),
                    coeffs,
                })
            })
            .collect()
    }

    /// Fastest-growing accepted mode after a solve.
    ///
    /// A numerical failure of the eigenvalue solve, or an empty accepted
    /// set, yields [`GrowthRate::nan`] so parameter sweeps can carry on.
    /// Configuration errors still propagate.
    pub fn growth_rate(&mut self, request: &SolveRequest) -> Result<GrowthRate> {
        match self.solve(request) {
            Ok(analysis) => match analysis.fastest_growing(self.grow_func, self.freq_func) {
                Some(rate) => Ok(rate),
                None => {
                    log::warn!(
                        "No eigenvalue accepted at {}; growth rate is NaN",
                        describe_parameters(self.problem.parameters())
                    );
                    Ok(GrowthRate::nan())
                }
            },
            Err(EigenError::Solve(err)) if err.is_recoverable() => {
                log::warn!(
                    "{} eigenvalue solve failed at {} (pencil {}): {}; growth rate is NaN",
                    request.mode().label(),
                    describe_parameters(self.problem.parameters()),
                    request.pencil,
                    err
                );
                Ok(GrowthRate::nan())
            }
            Err(err) => Err(err),
        }
    }
}

/// `name = value` list for log messages
fn describe_parameters<'a>(parameters: impl Iterator<Item = (&'a str, &'a Parameter)>) -> String {
    let described: Vec<String> = parameters
        .map(|(name, value)| match value {
            Parameter::Scalar(z) if z.im == 0.0 => format!("{} = {}", name, z.re),
            Parameter::Scalar(z) => format!("{} = {}", name, z),
            Parameter::Field(field) => format!("{} = <field, {} coefficients>", name, field.len()),
        })
        .collect();
    if described.is_empty() {
        "no parameters".to_string()
    } else {
        described.join(", ")
    }
}
