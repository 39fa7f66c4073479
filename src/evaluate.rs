//! Cluster-count evaluation.
//!
//! Fits k-means once per candidate count and records three quality signals:
//!
//! | Signal | Reads as |
//! |--------|----------|
//! | inertia | elbow curve, always falls with k |
//! | Davies-Bouldin | lower is better |
//! | silhouette | higher is better |
//!
//! Every fit uses the same fixed seed, so a sweep over the same matrix always
//! produces the same table.

use crate::cluster::Kmeans;
use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use crate::metrics;
use serde::{Deserialize, Serialize};

/// Seed shared by every k-means fit in the pipeline.
pub const DEFAULT_SEED: u64 = 42;

/// Settings for a seeded k-means fit, shared by the evaluator and the assigner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    /// RNG seed.
    pub seed: u64,
    /// Maximum Lloyd iterations per restart.
    pub max_iter: usize,
    /// Convergence tolerance on centroid shift.
    pub tol: f64,
    /// k-means++ restarts; the lowest inertia wins.
    pub n_init: usize,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
        }
    }
}

impl FitParams {
    /// A k-means model with these settings and `k` clusters.
    pub fn kmeans(&self, k: usize) -> Kmeans {
        Kmeans::new(k)
            .with_seed(self.seed)
            .with_max_iter(self.max_iter)
            .with_tol(self.tol)
            .with_n_init(self.n_init)
    }
}

/// Validated, strictly increasing sweep of candidate counts, each ≥ 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRange {
    counts: Vec<usize>,
}

impl CandidateRange {
    /// Validate an explicit list of candidates.
    pub fn new(counts: Vec<usize>) -> Result<Self> {
        if counts.is_empty() {
            return Err(Error::InvalidCandidateRange {
                reason: "no candidates".to_string(),
            });
        }
        if let Some(&k) = counts.iter().find(|&&k| k < 2) {
            return Err(Error::InvalidCandidateRange {
                reason: format!("candidate {k} is below 2"),
            });
        }
        if let Some(w) = counts.windows(2).find(|w| w[1] <= w[0]) {
            return Err(Error::InvalidCandidateRange {
                reason: format!("candidates must strictly increase ({} then {})", w[0], w[1]),
            });
        }
        Ok(Self { counts })
    }

    /// Every count from `k_min` to `k_max`, both included.
    pub fn inclusive(k_min: usize, k_max: usize) -> Result<Self> {
        if k_max < k_min {
            return Err(Error::InvalidCandidateRange {
                reason: format!("k_max {k_max} is below k_min {k_min}"),
            });
        }
        Self::new((k_min..=k_max).collect())
    }

    /// Candidates in ascending order.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Largest candidate.
    pub fn max(&self) -> usize {
        self.counts.last().copied().unwrap_or(0)
    }
}

impl Default for CandidateRange {
    /// The classic 2..=5 sweep.
    fn default() -> Self {
        Self {
            counts: vec![2, 3, 4, 5],
        }
    }
}

/// Quality signals for one candidate count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Candidate count.
    pub k: usize,
    /// Sum of squared distances to assigned centroids.
    pub inertia: f64,
    /// Davies-Bouldin index (≥ 0, lower is better).
    pub davies_bouldin: f64,
    /// Mean silhouette coefficient (in [-1, 1], higher is better).
    pub silhouette: f64,
}

/// The three per-signal curves, ready for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationCurves {
    /// `(k, inertia)`
    pub inertia: Vec<(usize, f64)>,
    /// `(k, davies_bouldin)`
    pub davies_bouldin: Vec<(usize, f64)>,
    /// `(k, silhouette)`
    pub silhouette: Vec<(usize, f64)>,
}

impl From<&[Evaluation]> for EvaluationCurves {
    fn from(evaluations: &[Evaluation]) -> Self {
        Self {
            inertia: evaluations.iter().map(|e| (e.k, e.inertia)).collect(),
            davies_bouldin: evaluations.iter().map(|e| (e.k, e.davies_bouldin)).collect(),
            silhouette: evaluations.iter().map(|e| (e.k, e.silhouette)).collect(),
        }
    }
}

/// Sweeps candidate counts over one feature matrix.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    params: FitParams,
}

impl Evaluator {
    /// Evaluator with explicit fit settings.
    pub fn new(params: FitParams) -> Self {
        Self { params }
    }

    /// One [`Evaluation`] per candidate, in candidate order.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCandidateRange`] if a candidate exceeds the row count.
    /// - [`Error::DegenerateClustering`] if a fit leaves a cluster empty or the
    ///   silhouette is undefined (k equal to the row count).
    pub fn evaluate(&self, data: &FeatureMatrix, candidates: &CandidateRange) -> Result<Vec<Evaluation>> {
        let n = data.n_rows();
        if candidates.max() > n {
            return Err(Error::InvalidCandidateRange {
                reason: format!("candidate {} exceeds {n} records", candidates.max()),
            });
        }

        candidates
            .counts()
            .iter()
            .map(|&k| self.evaluate_one(data, k))
            .collect()
    }

    fn evaluate_one(&self, data: &FeatureMatrix, k: usize) -> Result<Evaluation> {
        let fit = self.params.kmeans(k).fit(data)?;

        let non_empty = fit.non_empty_clusters();
        if non_empty < k {
            return Err(Error::DegenerateClustering { k, non_empty });
        }

        let evaluation = Evaluation {
            k,
            inertia: fit.inertia,
            davies_bouldin: metrics::davies_bouldin(data, &fit.labels, k)?,
            silhouette: metrics::silhouette(data, &fit.labels, k)?,
        };
        tracing::debug!(
            k,
            inertia = evaluation.inertia,
            davies_bouldin = evaluation.davies_bouldin,
            silhouette = evaluation.silhouette,
            n_iter = fit.n_iter,
            "evaluated candidate"
        );
        Ok(evaluation)
    }
}
