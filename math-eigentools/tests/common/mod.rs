//! Test backends shared by the integration tests
#![allow(dead_code)]

use math_eigentools::{
    Basis, Domain, EigenPairs, EigenProblem, Field, FieldSystem, Parameter, PencilMatrices,
    SolveError, SparseRequest, SpectralBackend,
};
use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;
use solvers::CsrMatrix;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub const RA_CRITICAL: f64 = 1708.0;

/// Converged eigenvalue `m` of the model problem
pub fn physical_eigenvalue(ra: f64, pencil: usize, m: usize) -> Complex64 {
    let growth = (ra - RA_CRITICAL) / RA_CRITICAL;
    Complex64::new(growth - 0.3 * m as f64 - 0.5 * pencil as f64, 0.2 * m as f64)
}

/// Diagonal model of a spectral discretization.
///
/// The first `physical` eigenvalues depend on `Ra` and converge like
/// `N^-8` with the basis size `N`. Up to `infinite` further modes have a
/// singular mass entry. Everything else is spurious and scales with `N^2`.
/// Eigenvalues come out in reverse order, eigenvectors are unit vectors.
pub struct ModelBackend {
    pub physical: usize,
    pub infinite: usize,
    pub pencils: usize,
    /// Solves fail when `Ra` exceeds this value
    pub fail_above: Option<f64>,
    failing: Cell<bool>,
    /// Basis sizes of every assembled pencil
    pub assembled: RefCell<Vec<usize>>,
}

impl Default for ModelBackend {
    fn default() -> Self {
        Self {
            physical: 4,
            infinite: 0,
            pencils: 2,
            fail_above: None,
            failing: Cell::new(false),
            assembled: RefCell::new(Vec::new()),
        }
    }
}

impl ModelBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_infinite(mut self, count: usize) -> Self {
        self.infinite = count;
        self
    }

    pub fn failing_above(mut self, ra: f64) -> Self {
        self.fail_above = Some(ra);
        self
    }

    fn diagonals(
        &self,
        problem: &EigenProblem,
        pencil: usize,
    ) -> Result<(Vec<Complex64>, Vec<Complex64>), SolveError> {
        let size = problem
            .basis()
            .map_err(|e| SolveError::Assembly(e.to_string()))?
            .size;
        let ra = problem
            .parameter("Ra")
            .and_then(Parameter::as_scalar)
            .ok_or_else(|| SolveError::Assembly("Ra is not a scalar".into()))?
            .re;
        if let Some(Parameter::Field(profile)) = problem.parameter("T0") {
            if profile.len() != size {
                return Err(SolveError::Assembly(format!(
                    "T0 has {} coefficients on a basis of size {}",
                    profile.len(),
                    size
                )));
            }
        }
        self.failing
            .set(self.fail_above.is_some_and(|limit| ra > limit));

        let n = problem.variables.len() * size;
        let nf = size as f64;
        let error = nf.powi(-8);

        let mut l = Vec::with_capacity(n);
        let mut m = Vec::with_capacity(n);
        for i in 0..n {
            if i < self.physical {
                l.push(physical_eigenvalue(ra, pencil, i) + error);
                m.push(Complex64::new(-1.0, 0.0));
            } else if i < self.physical + self.infinite {
                l.push(Complex64::new(1.0, 0.0));
                m.push(Complex64::new(0.0, 0.0));
            } else {
                let j = (i - self.physical - self.infinite) as f64;
                l.push(Complex64::new(nf * nf * (1.0 + 0.37 * j), 3.0 * nf * (j + 1.0)));
                m.push(Complex64::new(-1.0, 0.0));
            }
        }
        l.reverse();
        m.reverse();
        Ok((l, m))
    }

    fn eigenvalues(matrices: &PencilMatrices) -> Vec<Complex64> {
        (0..matrices.dimension())
            .map(|i| {
                let mass = matrices.m.get(i, i);
                if mass.norm() == 0.0 {
                    Complex64::new(f64::INFINITY, 0.0)
                } else {
                    -matrices.l.get(i, i) / mass
                }
            })
            .collect()
    }
}

impl SpectralBackend for ModelBackend {
    fn num_pencils(&self, _problem: &EigenProblem) -> usize {
        self.pencils
    }

    fn assemble(&self, problem: &EigenProblem, pencil: usize) -> Result<PencilMatrices, SolveError> {
        let (l, m) = self.diagonals(problem, pencil)?;
        let n = l.len();
        self.assembled
            .borrow_mut()
            .push(problem.basis().map(|b| b.size).unwrap_or(0));
        Ok(PencilMatrices {
            l: CsrMatrix::from_diagonal(&Array1::from_vec(l)),
            m: CsrMatrix::from_diagonal(&Array1::from_vec(m)),
            pre_right: CsrMatrix::identity(n),
        })
    }

    fn solve_dense(&self, matrices: &PencilMatrices) -> Result<EigenPairs, SolveError> {
        if self.failing.get() {
            return Err(SolveError::DenseFailure(
                "eigenvalue algorithm failed to converge".into(),
            ));
        }
        let n = matrices.dimension();
        Ok(EigenPairs::new(
            Array1::from_vec(Self::eigenvalues(matrices)),
            Some(Array2::eye(n)),
        ))
    }

    fn solve_sparse(
        &self,
        matrices: &PencilMatrices,
        request: &SparseRequest,
    ) -> Result<EigenPairs, SolveError> {
        if self.failing.get() {
            return Err(SolveError::SparseNoConvergence {
                requested: request.mode_count,
                converged: 0,
            });
        }
        let values = Self::eigenvalues(matrices);
        let mut order: Vec<usize> = (0..values.len())
            .filter(|&i| values[i].is_finite())
            .collect();
        order.sort_by(|&a, &b| {
            (values[a] - request.target)
                .norm()
                .total_cmp(&(values[b] - request.target).norm())
        });
        order.truncate(request.mode_count);

        let n = matrices.dimension();
        let mut vectors = Array2::zeros((n, order.len()));
        for (col, &row) in order.iter().enumerate() {
            vectors[[row, col]] = Complex64::new(1.0, 0.0);
        }
        Ok(EigenPairs::new(
            order.iter().map(|&i| values[i]).collect(),
            Some(vectors),
        ))
    }

    fn unpack_state(
        &self,
        problem: &EigenProblem,
        eigenvector: ArrayView1<Complex64>,
    ) -> Result<FieldSystem, SolveError> {
        let basis = problem
            .basis()
            .map_err(|e| SolveError::Assembly(e.to_string()))?;
        let size = basis.size;
        let fields = problem
            .variables
            .iter()
            .enumerate()
            .map(|(v, name)| {
                let coeffs = eigenvector.slice(ndarray::s![v * size..(v + 1) * size]).to_owned();
                Field::from_coefficients(name.clone(), basis.clone(), coeffs)
                    .map_err(|e| SolveError::Assembly(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldSystem::new(fields))
    }
}

/// Two-variable model problem on a Chebyshev basis of `size` modes
pub fn model_problem(size: usize) -> EigenProblem {
    let z = Basis::chebyshev("z", size, (-0.5, 0.5));
    let mut problem = EigenProblem::new(Domain::new(vec![z]), ["w", "T"], "sigma");
    problem.set_parameter("Ra", RA_CRITICAL);
    problem.set_parameter("Pr", 1.0);
    problem.add_substitution("dt(A)", "sigma*A");
    problem.add_equation("dt(w) - Pr*dz(dz(w)) - Ra*Pr*T = 0");
    problem.add_equation("dt(T) - w - dz(dz(T)) = 0");
    problem.add_bc("left(w) = 0");
    problem.add_bc("right(w) = 0");
    problem
}

/// Fixed eigenvalues per basis size, unit eigenvectors
pub struct ScriptedBackend {
    spectra: HashMap<usize, Vec<Complex64>>,
}

impl ScriptedBackend {
    pub fn new(spectra: impl IntoIterator<Item = (usize, Vec<Complex64>)>) -> Self {
        Self {
            spectra: spectra.into_iter().collect(),
        }
    }

    fn spectrum(&self, problem: &EigenProblem) -> Result<&Vec<Complex64>, SolveError> {
        let size = problem
            .basis()
            .map_err(|e| SolveError::Assembly(e.to_string()))?
            .size;
        self.spectra
            .get(&size)
            .ok_or_else(|| SolveError::Assembly(format!("no spectrum for size {}", size)))
    }
}

impl SpectralBackend for ScriptedBackend {
    fn num_pencils(&self, _problem: &EigenProblem) -> usize {
        1
    }

    fn assemble(&self, problem: &EigenProblem, _pencil: usize) -> Result<PencilMatrices, SolveError> {
        let values = Array1::from_vec(self.spectrum(problem)?.clone());
        let n = values.len();
        Ok(PencilMatrices {
            l: CsrMatrix::from_diagonal(&values),
            m: CsrMatrix::identity(n).negated(),
            pre_right: CsrMatrix::identity(n),
        })
    }

    fn solve_dense(&self, matrices: &PencilMatrices) -> Result<EigenPairs, SolveError> {
        let n = matrices.dimension();
        let values = (0..n).map(|i| matrices.l.get(i, i)).collect();
        Ok(EigenPairs::new(values, Some(Array2::eye(n))))
    }

    fn solve_sparse(
        &self,
        _matrices: &PencilMatrices,
        _request: &SparseRequest,
    ) -> Result<EigenPairs, SolveError> {
        Err(SolveError::SparseInternal("scripted spectra are dense only".into()))
    }

    fn unpack_state(
        &self,
        problem: &EigenProblem,
        eigenvector: ArrayView1<Complex64>,
    ) -> Result<FieldSystem, SolveError> {
        let basis = Basis::chebyshev("z", eigenvector.len(), (0.0, 1.0));
        let field = Field::from_coefficients(problem.variables[0].clone(), basis, eigenvector.to_owned())
            .map_err(|e| SolveError::Assembly(e.to_string()))?;
        Ok(FieldSystem::new(vec![field]))
    }
}

/// One-variable problem whose only role is to carry a basis size
pub fn sized_problem(size: usize) -> EigenProblem {
    let z = Basis::chebyshev("z", size, (0.0, 1.0));
    EigenProblem::new(Domain::new(vec![z]), ["u"], "lambda")
}
