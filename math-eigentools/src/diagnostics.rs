//! Read-only views of an [`Analysis`] for reporting.
//!
//! Growth rates for parameter sweeps, spectrum selection and the data behind
//! drift-ratio plots. Nothing here renders anything.

use crate::eigenproblem::{Analysis, Selector};
use crate::error::{EigenError, Result};
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::fmt;
use std::str::FromStr;

/// Growth rate of the fastest-growing mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthRate {
    pub rate: f64,
    /// Position in the accepted set
    pub index: Option<usize>,
    pub frequency: f64,
}

impl GrowthRate {
    /// Sentinel for a parameter point that could not be evaluated
    pub fn nan() -> Self {
        Self {
            rate: f64::NAN,
            index: None,
            frequency: f64::NAN,
        }
    }

    pub fn is_nan(&self) -> bool {
        self.rate.is_nan()
    }

    /// `(rate, index, frequency)` with a NaN index for the sentinel
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        let index = self.index.map_or(f64::NAN, |i| i as f64);
        (self.rate, index, self.frequency)
    }
}

/// Mode with the largest `grow_func`.
///
/// NaN scores are ignored and ties go to the first occurrence. Returns
/// `None` when no eigenvalue has a usable score.
pub fn fastest_growing(
    evalues: ArrayView1<Complex64>,
    grow_func: Selector,
    freq_func: Selector,
) -> Option<GrowthRate> {
    let (index, rate) = evalues
        .iter()
        .map(|&z| grow_func(z))
        .enumerate()
        .filter(|(_, g)| !g.is_nan())
        .fold(None, |best: Option<(usize, f64)>, (i, g)| match best {
            Some((_, b)) if b >= g => best,
            _ => Some((i, g)),
        })?;

    Some(GrowthRate {
        rate,
        index: Some(index),
        frequency: freq_func(evalues[index]),
    })
}

/// Which eigenvalues to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumKind {
    /// Accepted eigenvalues
    Good,
    /// Everything from the base-resolution solve
    Low,
    /// Everything from the shadow solve
    High,
}

impl FromStr for SpectrumKind {
    type Err = EigenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "good" => Ok(SpectrumKind::Good),
            "low" => Ok(SpectrumKind::Low),
            "high" => Ok(SpectrumKind::High),
            other => Err(EigenError::UnsupportedSpectrum(other.to_string())),
        }
    }
}

impl fmt::Display for SpectrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpectrumKind::Good => "good",
            SpectrumKind::Low => "low",
            SpectrumKind::High => "high",
        };
        write!(f, "{}", name)
    }
}

/// Inverse drift per sorted base-resolution eigenvalue
#[derive(Debug, Clone, PartialEq)]
pub struct DriftRatios {
    /// Mode numbers `0..n` in sorted order
    pub modes: Array1<usize>,
    /// `1 / delta_near`
    pub nearest: Array1<f64>,
    /// `1 / delta_ordinal`
    pub ordinal: Array1<f64>,
    pub nearest_accepted: Array1<bool>,
    pub ordinal_accepted: Array1<bool>,
    pub threshold: f64,
}

impl Analysis {
    /// Eigenvalues of the selected spectrum
    pub fn spectrum(&self, kind: SpectrumKind) -> Result<&Array1<Complex64>> {
        match kind {
            SpectrumKind::Good => Ok(self.evalues()),
            SpectrumKind::Low => Ok(self.evalues_low()),
            SpectrumKind::High => self.evalues_high().ok_or(EigenError::RejectionDisabled),
        }
    }

    /// Drift-ratio data of the rejection pass
    pub fn drift_ratios(&self) -> Result<DriftRatios> {
        let rejection = self
            .rejection
            .as_ref()
            .ok_or(EigenError::RejectionDisabled)?;
        let threshold = rejection.drift_threshold;

        let nearest = rejection.delta_near.mapv(f64::recip);
        let ordinal = rejection.delta_ordinal.mapv(f64::recip);

        Ok(DriftRatios {
            modes: Array1::from_iter(0..nearest.len()),
            nearest_accepted: nearest.mapv(|r| r > threshold),
            ordinal_accepted: ordinal.mapv(|r| r > threshold),
            nearest,
            ordinal,
            threshold,
        })
    }
}
