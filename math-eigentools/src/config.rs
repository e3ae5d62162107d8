//! Construction-time options of the dual-resolution analysis

use crate::error::{EigenError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options fixed when an [`Eigenproblem`](crate::Eigenproblem) is built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EigenproblemConfig {
    /// Solve a second, finer problem and drop eigenvalues that drift
    #[serde(default = "default_reject")]
    pub reject: bool,
    /// Resolution multiplier of the shadow problem
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// Minimum inverse drift of an accepted eigenvalue
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
    /// Compare eigenvalues of equal rank instead of nearest neighbours
    #[serde(default)]
    pub use_ordinal: bool,
    /// Grid scale used when reporting collocation points
    #[serde(default = "default_scales")]
    pub scales: f64,
}

fn default_reject() -> bool {
    true
}

fn default_factor() -> f64 {
    1.5
}

fn default_drift_threshold() -> f64 {
    1e6
}

fn default_scales() -> f64 {
    1.0
}

impl Default for EigenproblemConfig {
    fn default() -> Self {
        Self {
            reject: default_reject(),
            factor: default_factor(),
            drift_threshold: default_drift_threshold(),
            use_ordinal: false,
            scales: default_scales(),
        }
    }
}

impl EigenproblemConfig {
    pub fn with_reject(mut self, reject: bool) -> Self {
        self.reject = reject;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_drift_threshold(mut self, threshold: f64) -> Self {
        self.drift_threshold = threshold;
        self
    }

    pub fn with_ordinal(mut self, use_ordinal: bool) -> Self {
        self.use_ordinal = use_ordinal;
        self
    }

    pub fn with_scales(mut self, scales: f64) -> Self {
        self.scales = scales;
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.factor.is_finite() && self.factor > 0.0) {
            return Err(EigenError::InvalidConfig(format!(
                "resolution factor must be positive, got {}",
                self.factor
            )));
        }
        if self.drift_threshold.is_nan() {
            return Err(EigenError::InvalidConfig(
                "drift threshold is NaN".to_string(),
            ));
        }
        if !(self.scales.is_finite() && self.scales > 0.0) {
            return Err(EigenError::InvalidConfig(format!(
                "grid scale must be positive, got {}",
                self.scales
            )));
        }
        Ok(())
    }

    /// Parse a JSON document; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EigenproblemConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
