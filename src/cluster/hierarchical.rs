//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters, then cuts it to a fixed number of clusters.
//!
//! # Linkage Methods
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance |
//!
//! Ward is the default: it increases within-cluster variance the least at
//! each merge, which matches the k-means objective used elsewhere.
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```

use super::dendrogram::Dendrogram;
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use kodama::{linkage as kodama_linkage, Method as KodamaMethod};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    #[default]
    Ward,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Ward => "ward",
        };
        f.write_str(name)
    }
}

impl FromStr for Linkage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "ward" => Ok(Linkage::Ward),
            _ => Err(Error::InvalidParameter {
                name: "linkage",
                message: "expected one of single, complete, average, ward",
            }),
        }
    }
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    /// Number of clusters to produce.
    n_clusters: usize,
    /// Linkage method.
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer with Ward linkage.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::Ward,
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram(&self, data: &FeatureMatrix) -> Result<Dendrogram> {
        let n = data.n_rows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if n == 1 {
            return Ok(Dendrogram::new(1));
        }

        let x = data.view();

        // Condensed dissimilarity matrix (upper triangle, row-major), N-choose-2 long.
        let mut condensed = Vec::with_capacity((n * (n - 1)) / 2);
        for row in 0..(n - 1) {
            for col in (row + 1)..n {
                let d = x
                    .row(row)
                    .iter()
                    .zip(x.row(col).iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt();
                condensed.push(d);
            }
        }

        let method = match self.linkage {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        };

        let dend = kodama_linkage(&mut condensed, n, method);

        let mut dendro = Dendrogram::new(n);
        for step in dend.steps() {
            dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity);
        }

        Ok(dendro)
    }
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<Vec<usize>> {
        let n = data.n_rows();
        if self.n_clusters == 0 || self.n_clusters > n {
            return Err(Error::InvalidClusterCount {
                requested: self.n_clusters,
                n_items: n,
            });
        }
        let dendro = self.fit_dendrogram(data)?;
        dendro.cut_to_k(self.n_clusters)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        FeatureMatrix::from_rows(vec![Column::Height, Column::TrunkDiameter], &rows).unwrap()
    }

    #[test]
    fn test_hierarchical_basic() {
        let data = matrix(&[[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]]);

        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average, Linkage::Ward] {
            let labels = HierarchicalClustering::new(2)
                .with_linkage(linkage)
                .fit_predict(&data)
                .unwrap();

            assert_eq!(labels[0], labels[1], "{linkage}");
            assert_eq!(labels[2], labels[3], "{linkage}");
            assert_ne!(labels[0], labels[2], "{linkage}");
        }
    }

    #[test]
    fn test_three_groups() {
        let data = matrix(&[
            [0.0, 0.0],
            [0.2, 0.1],
            [5.0, 5.0],
            [5.1, 5.2],
            [20.0, 0.0],
            [20.2, 0.1],
        ]);
        let labels = HierarchicalClustering::new(3).fit_predict(&data).unwrap();
        assert_eq!(labels, vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn test_dendrogram() {
        let data = matrix(&[[0.0, 0.0], [1.0, 0.0], [10.0, 0.0]]);

        let dendro = HierarchicalClustering::new(2).fit_dendrogram(&data).unwrap();

        assert_eq!(dendro.n_items(), 3);
        assert_eq!(dendro.n_merges(), 2);
    }

    #[test]
    fn test_single_point() {
        let data = matrix(&[[3.0, 4.0]]);
        let labels = HierarchicalClustering::new(1).fit_predict(&data).unwrap();
        assert_eq!(labels, vec![0]);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let data = matrix(&[[0.0, 0.0], [1.0, 0.0]]);
        assert!(HierarchicalClustering::new(3).fit_predict(&data).is_err());
        assert!(HierarchicalClustering::new(0).fit_predict(&data).is_err());
    }

    #[test]
    fn test_linkage_parse() {
        assert_eq!("Ward".parse::<Linkage>().unwrap(), Linkage::Ward);
        assert!("median".parse::<Linkage>().is_err());
    }
}
