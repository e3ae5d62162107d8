//! Eigenvalue problem description.
//!
//! [`EigenProblem`] is the algebraic system a [`SpectralBackend`](crate::SpectralBackend)
//! discretizes: variables, equations, boundary conditions, substitutions and
//! named parameters. Equations and boundary conditions are opaque strings
//! here; only the backend interprets them. This module owns the parts the
//! dual-resolution check depends on: parameter overrides and the
//! construction of the higher-resolution shadow copy.

use crate::basis::Basis;
use crate::error::{EigenError, Result};
use crate::field::Field;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a named problem parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// Constant coefficient
    Scalar(Complex64),
    /// Spatially varying coefficient
    Field(Field),
}

impl Parameter {
    /// Copy of this parameter for a problem discretized on `basis`.
    ///
    /// Scalars are copied as is; fields are resampled into fresh storage.
    pub fn at_resolution(&self, basis: &Basis) -> Parameter {
        match self {
            Parameter::Scalar(value) => Parameter::Scalar(*value),
            Parameter::Field(field) => Parameter::Field(field.resample(basis)),
        }
    }

    pub fn as_scalar(&self) -> Option<Complex64> {
        match self {
            Parameter::Scalar(value) => Some(*value),
            Parameter::Field(_) => None,
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Parameter::Scalar(_) => None,
            Parameter::Field(field) => Some(field),
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Scalar(Complex64::new(value, 0.0))
    }
}

impl From<Complex64> for Parameter {
    fn from(value: Complex64) -> Self {
        Parameter::Scalar(value)
    }
}

impl From<Field> for Parameter {
    fn from(field: Field) -> Self {
        Parameter::Field(field)
    }
}

/// Product of one-dimensional bases
///
/// The last basis is the one the eigenvalue problem is discretized on. The
/// others are transverse directions, only used when embedding a mode into a
/// larger domain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Domain {
    pub bases: Vec<Basis>,
}

impl Domain {
    pub fn new(bases: Vec<Basis>) -> Self {
        Self { bases }
    }

    /// Read a domain description such as
    /// `{"bases": [{"name": "z", "kind": "chebyshev", "size": 32, "interval": [-0.5, 0.5]}]}`
    pub fn from_json(json: &str) -> Result<Self> {
        let domain: Domain = serde_json::from_str(json)?;
        if let Some(empty) = domain.bases.iter().find(|b| b.size == 0) {
            return Err(EigenError::InvalidConfig(format!(
                "basis {} has no modes",
                empty.name
            )));
        }
        Ok(domain)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Basis of the eigenvalue problem
    pub fn primary(&self) -> Result<&Basis> {
        self.bases.last().ok_or(EigenError::NoBases)
    }

    /// Number of modes along each basis
    pub fn shape(&self) -> Vec<usize> {
        self.bases.iter().map(|b| b.size).collect()
    }

    pub fn dim(&self) -> usize {
        self.bases.len()
    }
}

/// A linear eigenvalue problem `L x + lambda M x = 0` in symbolic form
#[derive(Debug, Clone, PartialEq)]
pub struct EigenProblem {
    pub domain: Domain,
    /// Unknown field names, in the order the backend stacks them
    pub variables: Vec<String>,
    /// Name of the eigenvalue symbol
    pub eigenvalue: String,
    parameters: BTreeMap<String, Parameter>,
    substitutions: Vec<(String, String)>,
    equations: Vec<String>,
    boundary_conditions: Vec<String>,
    /// Magnitude below which non-constant coefficient terms are dropped
    pub ncc_cutoff: f64,
    /// Upper bound on the number of non-constant coefficient terms
    pub max_ncc_terms: Option<usize>,
    pub tolerance: f64,
}

impl EigenProblem {
    pub fn new<S: Into<String>>(
        domain: Domain,
        variables: impl IntoIterator<Item = S>,
        eigenvalue: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            variables: variables.into_iter().map(Into::into).collect(),
            eigenvalue: eigenvalue.into(),
            parameters: BTreeMap::new(),
            substitutions: Vec::new(),
            equations: Vec::new(),
            boundary_conditions: Vec::new(),
            ncc_cutoff: 1e-6,
            max_ncc_terms: None,
            tolerance: 1e-10,
        }
    }

    pub fn with_ncc_cutoff(mut self, cutoff: f64) -> Self {
        self.ncc_cutoff = cutoff;
        self
    }

    pub fn with_max_ncc_terms(mut self, terms: usize) -> Self {
        self.max_ncc_terms = Some(terms);
        self
    }

    pub fn add_equation(&mut self, equation: impl Into<String>) {
        self.equations.push(equation.into());
    }

    pub fn add_bc(&mut self, condition: impl Into<String>) {
        self.boundary_conditions.push(condition.into());
    }

    /// Register a macro; expansions are applied by the backend in insertion order
    pub fn add_substitution(&mut self, name: impl Into<String>, expansion: impl Into<String>) {
        self.substitutions.push((name.into(), expansion.into()));
    }

    /// Declare (or redeclare) a parameter
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Parameter>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Override a declared parameter
    pub fn update_parameter(&mut self, name: &str, value: Parameter) -> Result<()> {
        match self.parameters.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EigenError::UnknownParameter {
                name: name.to_string(),
            }),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn substitutions(&self) -> &[(String, String)] {
        &self.substitutions
    }

    pub fn equations(&self) -> &[String] {
        &self.equations
    }

    pub fn boundary_conditions(&self) -> &[String] {
        &self.boundary_conditions
    }

    /// Basis the problem is discretized on
    pub fn basis(&self) -> Result<&Basis> {
        self.domain.primary()
    }

    /// Total number of unknowns: variables times modes
    pub fn dimension(&self) -> Result<usize> {
        Ok(self.variables.len() * self.basis()?.size)
    }

    /// The same problem on a basis `factor` times finer.
    ///
    /// Equations, boundary conditions, substitutions and tolerances are
    /// copied; field-valued parameters are resampled onto the new basis so
    /// the shadow never shares field data with `self`. Transverse bases are
    /// kept as they are.
    pub fn shadow(&self, factor: f64) -> Result<EigenProblem> {
        let basis = self.basis()?.scaled(factor);

        let mut bases = self.domain.bases.clone();
        if let Some(last) = bases.last_mut() {
            *last = basis.clone();
        }

        let parameters = self
            .parameters
            .iter()
            .map(|(name, value)| (name.clone(), value.at_resolution(&basis)))
            .collect();

        Ok(EigenProblem {
            domain: Domain::new(bases),
            variables: self.variables.clone(),
            eigenvalue: self.eigenvalue.clone(),
            parameters,
            substitutions: self.substitutions.clone(),
            equations: self.equations.clone(),
            boundary_conditions: self.boundary_conditions.clone(),
            ncc_cutoff: self.ncc_cutoff,
            max_ncc_terms: self.max_ncc_terms,
            tolerance: self.tolerance,
        })
    }
}
