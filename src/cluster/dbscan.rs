//! Density clustering (DBSCAN).
//!
//! A row is a core row when at least `min_pts` rows, itself included, lie
//! within `epsilon` of it. Clusters grow outward from core rows through their
//! neighborhoods. A non-core row reached by a cluster becomes a border member
//! of the first cluster to reach it; rows no cluster reaches are noise.
//!
//! The cluster count is an output. Neighborhoods are brute-force scans, so a
//! fit costs O(n²) distance evaluations.

use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use ndarray::ArrayView2;

/// DBSCAN parameters.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Neighborhood radius.
    epsilon: f64,
    /// Rows needed within `epsilon`, itself included.
    min_pts: usize,
}

impl Dbscan {
    /// Radius `epsilon`, density threshold `min_pts`.
    pub fn new(epsilon: f64, min_pts: usize) -> Self {
        Self { epsilon, min_pts }
    }

    /// Euclidean distance between rows `i` and `j`.
    #[inline]
    fn distance(x: &ArrayView2<'_, f64>, i: usize, j: usize) -> f64 {
        x.row(i)
            .iter()
            .zip(x.row(j).iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// All other points within epsilon.
    fn region_query(&self, x: &ArrayView2<'_, f64>, point_idx: usize) -> Vec<usize> {
        (0..x.nrows())
            .filter(|&idx| idx != point_idx && Self::distance(x, point_idx, idx) <= self.epsilon)
            .collect()
    }

    /// Fit and return one label per row; `None` marks noise.
    pub fn fit_predict_with_noise(&self, data: &FeatureMatrix) -> Result<Vec<Option<usize>>> {
        let n = data.n_rows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                message: "must be positive",
            });
        }

        if self.min_pts == 0 {
            return Err(Error::InvalidParameter {
                name: "min_pts",
                message: "must be at least 1",
            });
        }

        let x = data.view();
        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut cluster_id = 0;

        for point_idx in 0..n {
            if visited[point_idx] {
                continue;
            }
            visited[point_idx] = true;

            let neighbors = self.region_query(&x, point_idx);
            // MinPts includes the point itself
            if neighbors.len() + 1 < self.min_pts {
                // Stays noise unless a later cluster reaches it as a border point.
                continue;
            }

            labels[point_idx] = Some(cluster_id);
            let mut to_process = neighbors;

            while let Some(idx) = to_process.pop() {
                if labels[idx].is_none() {
                    labels[idx] = Some(cluster_id);
                }
                if visited[idx] {
                    continue;
                }
                visited[idx] = true;

                let next = self.region_query(&x, idx);
                if next.len() + 1 >= self.min_pts {
                    to_process.extend(next.into_iter().filter(|&nn| !visited[nn] || labels[nn].is_none()));
                }
            }

            cluster_id += 1;
        }

        tracing::debug!(
            clusters = cluster_id,
            noise = labels.iter().filter(|l| l.is_none()).count(),
            "dbscan finished"
        );
        Ok(labels)
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
    fn test_dbscan_two_clusters() {
        let data = matrix(&[
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.1, 0.1],
            [0.05, 0.05],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
            [5.1, 5.1],
            [5.05, 5.05],
        ]);

        let labels = Dbscan::new(0.3, 3).fit_predict_with_noise(&data).unwrap();

        assert_eq!(labels.len(), 10);
        assert!(labels.iter().all(|l| l.is_some()));
        assert!(labels[..5].iter().all(|&l| l == labels[0]));
        assert!(labels[5..].iter().all(|&l| l == labels[5]));
        assert_ne!(labels[0], labels[5]);
    }

    #[test]
    fn test_dbscan_with_noise() {
        let data = matrix(&[
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.1, 0.1],
            [100.0, 100.0],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
            [5.1, 5.1],
        ]);

        let labels = Dbscan::new(0.3, 3).fit_predict_with_noise(&data).unwrap();

        assert!(labels[4].is_none());
        for (i, label) in labels.iter().enumerate() {
            if i != 4 {
                assert!(label.is_some());
            }
        }
    }

    #[test]
    fn test_dbscan_border_point_visited_first() {
        // Point 0 is a border point seen before its core neighbor; it must
        // still join the cluster.
        let data = matrix(&[[-0.25, 0.0], [0.0, 0.0], [0.1, 0.0], [0.2, 0.0]]);

        let labels = Dbscan::new(0.26, 4).fit_predict_with_noise(&data).unwrap();

        // Only point 1 is core (itself + 3 neighbors); the rest are borders.
        assert!(labels.iter().all(|&l| l == Some(0)), "{labels:?}");
    }

    #[test]
    fn test_dbscan_all_noise() {
        let data = matrix(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]);
        let labels = Dbscan::new(0.5, 3).fit_predict_with_noise(&data).unwrap();
        assert!(labels.iter().all(|l| l.is_none()));
    }

    #[test]
    fn test_dbscan_chain() {
        // Chain of points - DBSCAN should connect them
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64 * 0.3, 0.0]).collect();
        let data = FeatureMatrix::from_rows(vec![Column::Height, Column::TrunkDiameter], &rows).unwrap();

        let labels = Dbscan::new(0.5, 2).fit_predict_with_noise(&data).unwrap();
        assert!(labels.iter().all(|&l| l == Some(0)));
    }

    #[test]
    fn test_dbscan_invalid_params() {
        let data = matrix(&[[0.0, 0.0]]);

        assert!(Dbscan::new(0.0, 3).fit_predict_with_noise(&data).is_err());
        assert!(Dbscan::new(-1.0, 3).fit_predict_with_noise(&data).is_err());
        assert!(Dbscan::new(f64::NAN, 3).fit_predict_with_noise(&data).is_err());
        assert!(Dbscan::new(0.5, 0).fit_predict_with_noise(&data).is_err());
    }
}
