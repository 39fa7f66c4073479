//! Configuration.
//!
//! ```toml
//! [evaluation]
//! k_min = 2
//! k_max = 5
//! elbow_rule = "max_inertia"
//!
//! [kmeans]
//! seed = 42
//! max_iter = 300
//! tol = 0.0001
//! n_init = 10
//!
//! [density]
//! eps = 0.1
//! min_samples = 5
//!
//! [agglomerative]
//! n_clusters = 3
//! linkage = "ward"
//! ```
//!
//! Every section and key is optional; missing values take the defaults above.

use crate::assign::{AgglomerativePartitioner, DensityPartitioner};
use crate::error::{Error, Result};
use crate::evaluate::{CandidateRange, FitParams};
use crate::select::ElbowRule;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Candidate sweep and selection
    pub evaluation: EvaluationConfig,
    /// k-means fit settings shared by evaluation and assignment
    pub kmeans: FitParams,
    /// Density partitioner parameters
    pub density: DensityPartitioner,
    /// Agglomerative partitioner parameters
    pub agglomerative: AgglomerativePartitioner,
}

/// Candidate sweep configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Smallest candidate count
    pub k_min: usize,
    /// Largest candidate count
    pub k_max: usize,
    /// Elbow reduction rule
    pub elbow_rule: ElbowRule,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            k_min: 2,
            k_max: 5,
            elbow_rule: ElbowRule::MaxInertia,
        }
    }
}

impl EvaluationConfig {
    /// The configured sweep.
    pub fn candidates(&self) -> Result<CandidateRange> {
        CandidateRange::inclusive(self.k_min, self.k_max)
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.evaluation.k_min < 2 {
            return Err(Error::Config(format!(
                "k_min must be at least 2, got {}",
                self.evaluation.k_min
            )));
        }
        if self.evaluation.k_max < self.evaluation.k_min {
            return Err(Error::Config(format!(
                "k_max ({}) must not be below k_min ({})",
                self.evaluation.k_max, self.evaluation.k_min
            )));
        }
        if self.kmeans.max_iter == 0 {
            return Err(Error::Config("max_iter must be > 0".to_string()));
        }
        if self.kmeans.n_init == 0 {
            return Err(Error::Config("n_init must be > 0".to_string()));
        }
        if self.kmeans.tol.is_nan() || self.kmeans.tol < 0.0 {
            return Err(Error::Config(format!("tol must be >= 0, got {}", self.kmeans.tol)));
        }
        if self.density.eps.is_nan() || self.density.eps <= 0.0 {
            return Err(Error::Config(format!("eps must be > 0, got {}", self.density.eps)));
        }
        if self.density.min_samples == 0 {
            return Err(Error::Config("min_samples must be > 0".to_string()));
        }
        if self.agglomerative.n_clusters == 0 {
            return Err(Error::Config("n_clusters must be > 0".to_string()));
        }
        Ok(())
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
