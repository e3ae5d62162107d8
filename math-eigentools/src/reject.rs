//! Spurious-eigenvalue rejection by the two-resolution delta test.
//!
//! An eigenvalue of the continuous problem converges with resolution, so it
//! barely moves between a solve at the base resolution and one on a finer
//! grid. Spurious eigenvalues move a lot. The movement of each low-resolution
//! eigenvalue is measured against the local spacing of the spectrum (sigma)
//! and only eigenvalues whose inverse drift exceeds a threshold are kept.
//!
//! Every eigenvalue carries the position it had in the solver output, so the
//! accepted ones can be traced back to their eigenvectors.

use crate::error::{EigenError, Result};
use ndarray::{Array1, ArrayView1};
use num_complex::Complex64;
use std::cmp::Ordering;

/// An eigenvalue with its position in the solver output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedEigenvalue {
    pub value: Complex64,
    pub index: usize,
}

/// Drop non-finite values, then stable-sort by real part.
pub fn tag_and_sort(values: ArrayView1<Complex64>) -> Vec<IndexedEigenvalue> {
    let mut tagged: Vec<IndexedEigenvalue> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.re.is_finite() && v.im.is_finite())
        .map(|(index, &value)| IndexedEigenvalue { value, index })
        .collect();
    tagged.sort_by(|a, b| {
        a.value
            .re
            .partial_cmp(&b.value.re)
            .unwrap_or(Ordering::Equal)
    });
    tagged
}

/// Local spacing of a sorted spectrum.
///
/// End points use their single neighbour; interior points average the
/// distances to both neighbours.
pub fn spacings(sorted: &[IndexedEigenvalue]) -> Result<Array1<f64>> {
    let n = sorted.len();
    if n < 2 {
        return Err(EigenError::InsufficientEigenvalues { found: n });
    }

    let gap = |j: usize| (sorted[j + 1].value - sorted[j].value).norm();
    let sigma = Array1::from_iter((0..n).map(|j| {
        if j == 0 {
            gap(0)
        } else if j == n - 1 {
            gap(n - 2)
        } else {
            0.5 * (gap(j - 1) + gap(j))
        }
    }));

    let bad = sigma.iter().filter(|s| !s.is_finite()).count();
    if bad > 0 {
        log::warn!("{} of {} eigenvalue spacings are not finite", bad, n);
    }
    Ok(sigma)
}

/// Drift against the high-resolution eigenvalue of the same rank.
///
/// Ranks with no high-resolution counterpart, or with a non-finite spacing,
/// get `+inf`.
pub fn ordinal_drift(
    low: &[IndexedEigenvalue],
    high: &[IndexedEigenvalue],
    sigma: &Array1<f64>,
) -> Array1<f64> {
    Array1::from_iter(low.iter().enumerate().map(|(j, lo)| match high.get(j) {
        Some(_) if !sigma[j].is_finite() => f64::INFINITY,
        Some(hi) => (lo.value - hi.value).norm() / sigma[j],
        None => f64::INFINITY,
    }))
}

/// Drift against the closest high-resolution eigenvalue.
///
/// NaN candidates are skipped. An empty high-resolution set or a non-finite
/// spacing gives `+inf`.
pub fn nearest_drift(
    low: &[IndexedEigenvalue],
    high: &[IndexedEigenvalue],
    sigma: &Array1<f64>,
) -> Array1<f64> {
    Array1::from_iter(low.iter().enumerate().map(|(j, lo)| {
        if high.is_empty() || !sigma[j].is_finite() {
            return f64::INFINITY;
        }
        high.iter()
            .map(|hi| (lo.value - hi.value).norm() / sigma[j])
            .filter(|d| !d.is_nan())
            .reduce(f64::min)
            .unwrap_or(f64::NAN)
    }))
}

/// Result of one rejection pass
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Surviving low-resolution eigenvalues, in sorted order
    pub accepted: Vec<IndexedEigenvalue>,
    /// Finite low-resolution eigenvalues, sorted by real part
    pub sorted_low: Vec<IndexedEigenvalue>,
    /// Finite high-resolution eigenvalues, sorted by real part
    pub sorted_high: Vec<IndexedEigenvalue>,
    pub sigma: Array1<f64>,
    pub delta_ordinal: Array1<f64>,
    pub delta_near: Array1<f64>,
    pub drift_threshold: f64,
    pub use_ordinal: bool,
}

impl Rejection {
    /// Accepted eigenvalues
    pub fn eigenvalues(&self) -> Array1<Complex64> {
        self.accepted.iter().map(|e| e.value).collect()
    }

    /// Solver-output positions of the accepted eigenvalues
    pub fn indices(&self) -> Vec<usize> {
        self.accepted.iter().map(|e| e.index).collect()
    }

    /// Inverse drift of the selected measure, one per sorted low eigenvalue
    pub fn inverse_drift(&self) -> Array1<f64> {
        let delta = if self.use_ordinal {
            &self.delta_ordinal
        } else {
            &self.delta_near
        };
        delta.mapv(f64::recip)
    }
}

/// Keep the low-resolution eigenvalues that did not drift.
///
/// `use_ordinal` selects the same-rank comparison instead of the nearest
/// match. Fails when fewer than two low-resolution eigenvalues are finite;
/// an empty accepted set is a valid outcome.
pub fn reject_spurious(
    low: ArrayView1<Complex64>,
    high: ArrayView1<Complex64>,
    use_ordinal: bool,
    drift_threshold: f64,
) -> Result<Rejection> {
    let sorted_low = tag_and_sort(low);
    let sorted_high = tag_and_sort(high);

    let sigma = spacings(&sorted_low)?;
    let delta_ordinal = ordinal_drift(&sorted_low, &sorted_high, &sigma);
    let delta_near = nearest_drift(&sorted_low, &sorted_high, &sigma);

    let mut rejection = Rejection {
        accepted: Vec::new(),
        sorted_low,
        sorted_high,
        sigma,
        delta_ordinal,
        delta_near,
        drift_threshold,
        use_ordinal,
    };

    let inverse = rejection.inverse_drift();
    rejection.accepted = rejection
        .sorted_low
        .iter()
        .zip(inverse.iter())
        .filter(|&(_, &inv)| inv > drift_threshold)
        .map(|(e, _)| *e)
        .collect();

    log::debug!(
        "Rejection ({}): {} finite low, {} finite high, {} accepted",
        if use_ordinal { "ordinal" } else { "nearest" },
        rejection.sorted_low.len(),
        rejection.sorted_high.len(),
        rejection.accepted.len()
    );

    Ok(rejection)
}
