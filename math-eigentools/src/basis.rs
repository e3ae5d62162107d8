//! Spectral bases and the resolution-scaling helper.
//!
//! A [`Basis`] only carries what the dual-resolution check needs to know
//! about the discretization: its family, its size, its interval and its
//! dealiasing factor. The collocation grid is exposed for reporting.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Family of a one-dimensional spectral basis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasisKind {
    /// Chebyshev polynomials on Gauss-Chebyshev points
    Chebyshev,
    /// Legendre polynomials on Gauss-Legendre points
    Legendre,
    /// Complex exponentials on a uniform periodic grid
    Fourier,
}

/// A one-dimensional spectral basis on a finite interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basis {
    /// Coordinate name (e.g. `"z"`)
    pub name: String,
    /// Basis family
    pub kind: BasisKind,
    /// Number of modes (base grid size)
    pub size: usize,
    /// Physical interval `(left, right)`
    pub interval: (f64, f64),
    /// Dealiasing scale factor
    #[serde(default = "default_dealias")]
    pub dealias: f64,
}

fn default_dealias() -> f64 {
    1.0
}

impl Basis {
    /// Create a basis with no dealiasing
    pub fn new(name: impl Into<String>, kind: BasisKind, size: usize, interval: (f64, f64)) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            interval,
            dealias: default_dealias(),
        }
    }

    /// Chebyshev basis
    pub fn chebyshev(name: impl Into<String>, size: usize, interval: (f64, f64)) -> Self {
        Self::new(name, BasisKind::Chebyshev, size, interval)
    }

    /// Legendre basis
    pub fn legendre(name: impl Into<String>, size: usize, interval: (f64, f64)) -> Self {
        Self::new(name, BasisKind::Legendre, size, interval)
    }

    /// Fourier basis
    pub fn fourier(name: impl Into<String>, size: usize, interval: (f64, f64)) -> Self {
        Self::new(name, BasisKind::Fourier, size, interval)
    }

    /// Set the dealiasing factor
    pub fn with_dealias(mut self, dealias: f64) -> Self {
        self.dealias = dealias;
        self
    }

    /// Interval length
    pub fn length(&self) -> f64 {
        self.interval.1 - self.interval.0
    }

    /// Number of grid points at the given scale: `ceil(size * scale)`
    pub fn grid_size(&self, scale: f64) -> usize {
        (self.size as f64 * scale).ceil() as usize
    }

    /// Same basis with `floor(size * factor)` modes.
    ///
    /// Name, family, interval and dealiasing are preserved. This is how the
    /// shadow problem gets its finer discretization.
    pub fn scaled(&self, factor: f64) -> Basis {
        if factor <= 1.0 {
            log::warn!(
                "Scaling basis '{}' by factor {} does not increase its resolution",
                self.name,
                factor
            );
        }
        let size = ((self.size as f64 * factor).floor() as usize).max(1);
        Basis {
            size,
            ..self.clone()
        }
    }

    /// Collocation points mapped onto the physical interval, in increasing order
    pub fn grid(&self, scale: f64) -> Array1<f64> {
        let n = self.grid_size(scale);
        let (left, right) = self.interval;
        let native = match self.kind {
            BasisKind::Chebyshev => chebyshev_gauss_points(n),
            BasisKind::Legendre => legendre_gauss_points(n),
            BasisKind::Fourier => {
                return Array1::from_iter(
                    (0..n).map(|i| left + (right - left) * i as f64 / n as f64),
                );
            }
        };
        native.mapv(|x| left + (x + 1.0) * 0.5 * (right - left))
    }
}

/// Gauss-Chebyshev points on [-1, 1]
fn chebyshev_gauss_points(n: usize) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| -(PI * (i as f64 + 0.5) / n as f64).cos()))
}

/// Gauss-Legendre points on [-1, 1] by Newton iteration on P_n
fn legendre_gauss_points(n: usize) -> Array1<f64> {
    let mut nodes = Array1::zeros(n);
    for i in 0..n {
        let mut x = -(PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_with_derivative(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        nodes[i] = x;
    }
    nodes
}

/// P_n(x) and P_n'(x) by the three-term recurrence
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p_prev = 1.0;
    let mut p = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let kf = k as f64;
        let p_next = ((2.0 * kf - 1.0) * x * p - (kf - 1.0) * p_prev) / kf;
        p_prev = p;
        p = p_next;
    }
    let dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
    (p, dp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scaled_keeps_identity() {
        let z = Basis::chebyshev("z", 16, (0.0, 1.0)).with_dealias(1.5);
        let hi = z.scaled(1.5);

        assert_eq!(hi.size, 24);
        assert_eq!(hi.name, "z");
        assert_eq!(hi.kind, BasisKind::Chebyshev);
        assert_eq!(hi.interval, (0.0, 1.0));
        assert_relative_eq!(hi.dealias, 1.5);
    }

    #[test]
    fn test_scaled_truncates_fractional_size() {
        let x = Basis::fourier("x", 15, (0.0, 2.0 * PI));
        assert_eq!(x.scaled(1.5).size, 22);
    }

    #[test]
    fn test_chebyshev_grid_inside_interval() {
        let z = Basis::chebyshev("z", 8, (0.0, 1.0));
        let grid = z.grid(1.0);

        assert_eq!(grid.len(), 8);
        for w in grid.windows(2) {
            assert!(w[0] < w[1]);
        }
        assert!(grid[0] > 0.0 && grid[7] < 1.0);
        // Symmetric about the midpoint
        assert_relative_eq!(grid[0] + grid[7], 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_grid_scale() {
        let z = Basis::chebyshev("z", 16, (-1.0, 1.0));
        assert_eq!(z.grid(1.5).len(), 24);
        assert_eq!(z.grid_size(0.5), 8);
    }

    #[test]
    fn test_fourier_grid_uniform() {
        let x = Basis::fourier("x", 4, (0.0, 2.0));
        let grid = x.grid(1.0);
        assert_eq!(grid.to_vec(), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_legendre_nodes() {
        // Three-point Gauss-Legendre: 0, ±sqrt(3/5)
        let basis = Basis::legendre("r", 3, (-1.0, 1.0));
        let grid = basis.grid(1.0);
        let s = (3.0_f64 / 5.0).sqrt();
        assert_relative_eq!(grid[0], -s, epsilon = 1e-13);
        assert_relative_eq!(grid[1], 0.0, epsilon = 1e-13);
        assert_relative_eq!(grid[2], s, epsilon = 1e-13);
    }
}
