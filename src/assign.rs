//! Final cluster assignment.
//!
//! [`ClusterAssigner`] partitions at the operator's chosen k with the same
//! seeded k-means the evaluator uses. [`DensityPartitioner`] and
//! [`AgglomerativePartitioner`] are independent alternatives that skip count
//! selection entirely.

use crate::cluster::{Clustering, Dbscan, HierarchicalClustering, Linkage};
use crate::dataset::Record;
use crate::error::{Error, Result};
use crate::evaluate::FitParams;
use crate::features::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label given to density noise points.
pub const NOISE: i32 = -1;

/// One cluster label per record.
///
/// Regular ids are `0..n_clusters`; only density partitioning emits [`NOISE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    labels: Vec<i32>,
    n_clusters: usize,
}

impl Assignment {
    fn from_hard(labels: Vec<usize>, n_clusters: usize) -> Self {
        Self {
            labels: labels.into_iter().map(|l| l as i32).collect(),
            n_clusters,
        }
    }

    fn from_density(labels: Vec<Option<usize>>) -> Self {
        let n_clusters = labels.iter().flatten().max().map_or(0, |&m| m + 1);
        Self {
            labels: labels
                .into_iter()
                .map(|l| l.map_or(NOISE, |c| c as i32))
                .collect(),
            n_clusters,
        }
    }

    /// Labels in record order.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Number of regular clusters (noise excluded).
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Records labelled [`NOISE`].
    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    /// Number of labelled records.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no records were labelled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Record indices per label, noise included under [`NOISE`].
    pub fn groups(&self) -> BTreeMap<i32, Vec<usize>> {
        let mut out: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, &l) in self.labels.iter().enumerate() {
            out.entry(l).or_default().push(i);
        }
        out
    }

    /// Write labels into the records they were computed from.
    pub fn apply(&self, records: &mut [Record]) -> Result<()> {
        if records.len() != self.labels.len() {
            return Err(Error::DimensionMismatch {
                expected: self.labels.len(),
                found: records.len(),
            });
        }
        for (record, &label) in records.iter_mut().zip(&self.labels) {
            record.cluster = Some(label);
        }
        Ok(())
    }
}

/// A way to turn a feature matrix into an [`Assignment`].
pub trait Partitioner {
    /// Short name for logs and plot titles.
    fn name(&self) -> &'static str;

    /// Partition every row.
    fn partition(&self, data: &FeatureMatrix) -> Result<Assignment>;
}

/// Seeded k-means at an operator-supplied k.
#[derive(Debug, Clone, Default)]
pub struct ClusterAssigner {
    params: FitParams,
}

impl ClusterAssigner {
    /// Assigner with explicit fit settings.
    pub fn new(params: FitParams) -> Self {
        Self { params }
    }

    /// Label every row with one of `k` clusters.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidClusterCount`] if `k` is 0 or exceeds the row count.
    pub fn assign(&self, data: &FeatureMatrix, k: usize) -> Result<Assignment> {
        let n = data.n_rows();
        if k < 1 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }
        let model = self.params.kmeans(k);
        let labels = model.fit_predict(data)?;
        tracing::info!(k, records = n, "assigned clusters");
        Ok(Assignment::from_hard(labels, model.n_clusters()))
    }

    /// Bind a fixed k, giving a [`Partitioner`].
    pub fn with_k(self, k: usize) -> KmeansPartitioner {
        KmeansPartitioner { assigner: self, k }
    }
}

/// [`ClusterAssigner`] bound to a fixed k.
#[derive(Debug, Clone)]
pub struct KmeansPartitioner {
    assigner: ClusterAssigner,
    k: usize,
}

impl Partitioner for KmeansPartitioner {
    fn name(&self) -> &'static str {
        "K-Means Clustering"
    }

    fn partition(&self, data: &FeatureMatrix) -> Result<Assignment> {
        self.assigner.assign(data, self.k)
    }
}

/// DBSCAN over the selected features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityPartitioner {
    /// Neighborhood radius.
    pub eps: f64,
    /// Points (including itself) a core point needs within `eps`.
    pub min_samples: usize,
}

impl Default for DensityPartitioner {
    fn default() -> Self {
        Self {
            eps: 0.1,
            min_samples: 5,
        }
    }
}

impl Partitioner for DensityPartitioner {
    fn name(&self) -> &'static str {
        "DBSCAN Clustering"
    }

    fn partition(&self, data: &FeatureMatrix) -> Result<Assignment> {
        let labels = Dbscan::new(self.eps, self.min_samples).fit_predict_with_noise(data)?;
        let assignment = Assignment::from_density(labels);
        tracing::info!(
            clusters = assignment.n_clusters(),
            noise = assignment.n_noise(),
            eps = self.eps,
            min_samples = self.min_samples,
            "density partition"
        );
        Ok(assignment)
    }
}

/// Agglomerative clustering to a fixed number of clusters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgglomerativePartitioner {
    /// Clusters to cut the dendrogram into.
    pub n_clusters: usize,
    /// Merge criterion.
    pub linkage: Linkage,
}

impl Default for AgglomerativePartitioner {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            linkage: Linkage::Ward,
        }
    }
}

impl Partitioner for AgglomerativePartitioner {
    fn name(&self) -> &'static str {
        "Agglomerative Clustering"
    }

    fn partition(&self, data: &FeatureMatrix) -> Result<Assignment> {
        let model = HierarchicalClustering::new(self.n_clusters).with_linkage(self.linkage);
        let labels = model.fit_predict(data)?;
        tracing::info!(k = self.n_clusters, linkage = %self.linkage, "agglomerative partition");
        Ok(Assignment::from_hard(labels, model.n_clusters()))
    }
}
