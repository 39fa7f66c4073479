//! Clustering traits.

use crate::error::Result;
use crate::features::FeatureMatrix;

/// Trait for hard clustering algorithms with a fixed cluster count.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels in `[0, n_clusters)`, one per row.
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
