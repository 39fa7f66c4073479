//! # canopy
//!
//! Choose a cluster count for tree inventory data, then partition it.
//!
//! The core loop fits seeded k-means over a sweep of candidate counts, scores
//! each fit three ways (inertia, Davies-Bouldin, silhouette), reports one
//! recommendation per score, and partitions at whatever count the operator
//! picks. Density (DBSCAN) and agglomerative partitioners are available as
//! standalone alternatives.
//!
//! ```rust
//! use canopy::{Analysis, FixedCount, Record};
//!
//! let records: Vec<Record> = (0..6)
//!     .flat_map(|i| {
//!         let d = i as f64 * 0.01;
//!         [
//!             Record::new(5.0 + d, 20.0).with_position(3.1, 49.1 + d),
//!             Record::new(25.0 + d, 60.0).with_position(3.4, 49.4 + d),
//!         ]
//!     })
//!     .collect();
//!
//! let outcome = Analysis::default().run(&records, &mut FixedCount(2)).unwrap();
//! assert_eq!(outcome.assignment.len(), 12);
//! println!("{}", outcome.recommended);
//! ```

pub mod assign;
pub mod cluster;
pub mod config;
pub mod dataset;
/// Error types used across `canopy`.
pub mod error;
pub mod evaluate;
pub mod features;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod select;

pub use assign::{
    AgglomerativePartitioner, Assignment, ClusterAssigner, DensityPartitioner, Partitioner, NOISE,
};
pub use config::Config;
pub use dataset::{Column, Record};
pub use error::{Error, Result};
pub use evaluate::{CandidateRange, Evaluation, EvaluationCurves, Evaluator, FitParams, DEFAULT_SEED};
pub use features::{FeatureMatrix, FeatureSelector};
pub use metrics::{davies_bouldin, inertia, silhouette};
pub use pipeline::{Analysis, AnalysisOutcome};
pub use prompt::{write_table, ClusterCountProvider, FixedCount, LinePrompt, SelectionReport};
pub use select::{select, ElbowRule, OptimalK, Selector};
