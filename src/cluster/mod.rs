//! Partitioning algorithms.
//!
//! Three ways to split a [`FeatureMatrix`](crate::features::FeatureMatrix)
//! into groups:
//!
//! | Algorithm | Cluster count | Noise | Used by |
//! |-----------|---------------|-------|---------|
//! | [`Kmeans`] | fixed k | no | evaluator sweep, cluster assigner |
//! | [`Dbscan`] | emergent | yes | density partitioner |
//! | [`HierarchicalClustering`] | fixed k | no | agglomerative partitioner |
//!
//! ### K-means
//!
//! Assign each point to the nearest centroid, move centroids to the mean of
//! their points, repeat. Minimizes within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Assumes roughly spherical clusters of similar size, and a k chosen in
//! advance; [`crate::evaluate`] exists to help pick that k.
//!
//! ### DBSCAN
//!
//! Grows clusters from dense cores. Points in sparse regions become noise.
//!
//! ### Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each point as its own cluster and repeatedly merge
//! the two closest clusters. The merge history forms a [`Dendrogram`] cut to
//! the requested count.
//!
//! ## Usage
//!
//! ```rust
//! use canopy::cluster::{Clustering, Kmeans};
//! use canopy::dataset::Column;
//! use canopy::features::FeatureMatrix;
//!
//! let data = FeatureMatrix::from_rows(
//!     vec![Column::Height, Column::TrunkDiameter],
//!     &[vec![0.0, 0.0], vec![0.1, 0.1], vec![10.0, 10.0], vec![10.1, 10.1]],
//! )
//! .unwrap();
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! ```

mod dbscan;
mod dendrogram;
mod hierarchical;
mod kmeans;
mod traits;

pub use dbscan::Dbscan;
pub use dendrogram::Dendrogram;
pub use hierarchical::{HierarchicalClustering, Linkage};
pub use kmeans::{Kmeans, KmeansFit};
pub use traits::Clustering;
