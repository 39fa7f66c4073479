//! Internal clustering quality metrics.
//!
//! Scores a labelling of a feature matrix without ground truth.
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Defined for |
//! |--------|-------|------|-------------|
//! | [`inertia`] | [0, ∞) | lower (falls with k) | k ≥ 1 |
//! | [`davies_bouldin`] | [0, ∞) | lower | k ≥ 2, all clusters non-empty |
//! | [`silhouette`] | [-1, 1] | higher | 2 ≤ k < n, all clusters non-empty |
//!
//! Inertia always improves as k grows, so it is read as a curve rather than
//! minimized directly. Davies-Bouldin and silhouette penalize both loose and
//! overlapping clusters and can be compared across k.
//!
//! # Example
//!
//! ```rust
//! use canopy::dataset::Column;
//! use canopy::features::FeatureMatrix;
//! use canopy::metrics::{davies_bouldin, silhouette};
//!
//! let data = FeatureMatrix::from_rows(
//!     vec![Column::Height, Column::TrunkDiameter],
//!     &[vec![1.0, 1.0], vec![1.0, 2.0], vec![10.0, 10.0], vec![10.0, 11.0]],
//! )
//! .unwrap();
//! let labels = [0, 0, 1, 1];
//!
//! assert!(davies_bouldin(&data, &labels, 2).unwrap() < 0.1);
//! assert!(silhouette(&data, &labels, 2).unwrap() > 0.9);
//! ```
//!
//! # References
//!
//! - Davies & Bouldin (1979). "A Cluster Separation Measure."
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation and
//!   validation of cluster analysis."

use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use ndarray::{Array2, ArrayView1};

/// Closeness threshold used to treat scatter or separation as zero.
const ZERO_TOL: f64 = 1e-8;

#[inline]
fn euclidean(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Check label shape and range, return per-cluster sizes.
fn cluster_sizes(data: &FeatureMatrix, labels: &[usize], k: usize) -> Result<Vec<usize>> {
    if data.n_rows() == 0 {
        return Err(Error::EmptyInput);
    }
    if labels.len() != data.n_rows() {
        return Err(Error::DimensionMismatch {
            expected: data.n_rows(),
            found: labels.len(),
        });
    }
    let mut sizes = vec![0usize; k];
    for &l in labels {
        if l >= k {
            return Err(Error::InvalidParameter {
                name: "labels",
                message: "label outside [0, k)",
            });
        }
        sizes[l] += 1;
    }
    Ok(sizes)
}

/// Require at least two clusters, every one populated.
fn require_populated(sizes: &[usize]) -> Result<()> {
    let k = sizes.len();
    let non_empty = sizes.iter().filter(|&&s| s > 0).count();
    if k < 2 || non_empty < k {
        return Err(Error::DegenerateClustering { k, non_empty });
    }
    Ok(())
}

/// Mean of each cluster's rows, shape (k, d). Empty clusters stay at zero.
pub fn centroids(data: &FeatureMatrix, labels: &[usize], k: usize) -> Result<Array2<f64>> {
    let sizes = cluster_sizes(data, labels, k)?;
    let mut out = Array2::zeros((k, data.n_cols()));
    for (i, &l) in labels.iter().enumerate() {
        let mut row = out.row_mut(l);
        row += &data.row(i);
    }
    for (c, &size) in sizes.iter().enumerate() {
        if size > 0 {
            let mut row = out.row_mut(c);
            row /= size as f64;
        }
    }
    Ok(out)
}

/// Within-cluster sum of squares around each cluster's mean.
pub fn inertia(data: &FeatureMatrix, labels: &[usize], k: usize) -> Result<f64> {
    let centers = centroids(data, labels, k)?;
    Ok(labels
        .iter()
        .enumerate()
        .map(|(i, &l)| euclidean(&data.row(i), &centers.row(l)).powi(2))
        .sum())
}

/// Davies-Bouldin index.
///
/// For each cluster, the worst ratio of summed scatter to centroid separation
/// against any other cluster, averaged over clusters:
///
/// ```text
/// DB = (1/k) Σᵢ maxⱼ≠ᵢ (sᵢ + sⱼ) / d(μᵢ, μⱼ)
/// ```
///
/// `sᵢ` is the mean distance of cluster i's points to its centroid. Two
/// clusters with coincident centroids contribute 0 for that pair, and the
/// index is 0 when every scatter or every separation is zero.
///
/// # Errors
///
/// [`Error::DegenerateClustering`] if k < 2 or a cluster is empty.
pub fn davies_bouldin(data: &FeatureMatrix, labels: &[usize], k: usize) -> Result<f64> {
    let sizes = cluster_sizes(data, labels, k)?;
    require_populated(&sizes)?;

    let centers = centroids(data, labels, k)?;

    let mut scatter = vec![0.0f64; k];
    for (i, &l) in labels.iter().enumerate() {
        scatter[l] += euclidean(&data.row(i), &centers.row(l));
    }
    for (s, &size) in scatter.iter_mut().zip(&sizes) {
        *s /= size as f64;
    }

    let mut separation = Array2::zeros((k, k));
    for i in 0..k {
        for j in (i + 1)..k {
            let d = euclidean(&centers.row(i), &centers.row(j));
            separation[[i, j]] = d;
            separation[[j, i]] = d;
        }
    }

    let all_compact = scatter.iter().all(|s| s.abs() < ZERO_TOL);
    let all_coincident = (0..k)
        .flat_map(|i| ((i + 1)..k).map(move |j| (i, j)))
        .all(|(i, j)| separation[[i, j]] < ZERO_TOL);
    if all_compact || all_coincident {
        return Ok(0.0);
    }

    let total: f64 = (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i)
                .map(|j| {
                    let d = separation[[i, j]];
                    if d < ZERO_TOL {
                        0.0
                    } else {
                        (scatter[i] + scatter[j]) / d
                    }
                })
                .fold(0.0f64, f64::max)
        })
        .sum();

    Ok(total / k as f64)
}

/// Mean silhouette coefficient over all points.
///
/// ```text
/// s(i) = (b - a) / max(a, b)
/// ```
///
/// `a` is the mean distance to the other members of the point's cluster and
/// `b` the lowest mean distance to any other cluster. Points alone in their
/// cluster score 0.
///
/// # Errors
///
/// [`Error::DegenerateClustering`] if k < 2, a cluster is empty, or n ≤ k.
pub fn silhouette(data: &FeatureMatrix, labels: &[usize], k: usize) -> Result<f64> {
    let sizes = cluster_sizes(data, labels, k)?;
    require_populated(&sizes)?;

    let n = data.n_rows();
    if n <= k {
        return Err(Error::DegenerateClustering { k, non_empty: k });
    }

    let mut total = 0.0;
    let mut sums = vec![0.0f64; k];
    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        let point = data.row(i);
        for j in 0..n {
            if i != j {
                sums[labels[j]] += euclidean(&point, &data.row(j));
            }
        }

        let own = labels[i];
        if sizes[own] == 1 {
            continue;
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Ok(total / n as f64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use proptest::prelude::*;

    fn two_pairs() -> FeatureMatrix {
        FeatureMatrix::from_rows(
            vec![Column::Height, Column::TrunkDiameter],
            &[vec![1.0, 1.0], vec![1.0, 2.0], vec![10.0, 10.0], vec![10.0, 11.0]],
        )
        .unwrap()
    }

    fn line(xs: &[f64]) -> FeatureMatrix {
        let rows: Vec<Vec<f64>> = xs.iter().map(|&x| vec![x]).collect();
        FeatureMatrix::from_rows(vec![Column::Height], &rows).unwrap()
    }

    #[test]
    fn test_inertia_two_pairs() {
        let v = inertia(&two_pairs(), &[0, 0, 1, 1], 2).unwrap();
        assert!((v - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_davies_bouldin_two_pairs() {
        let v = davies_bouldin(&two_pairs(), &[0, 0, 1, 1], 2).unwrap();
        assert!((v - 1.0 / 162f64.sqrt()).abs() < 1e-12, "{v}");
    }

    #[test]
    fn test_silhouette_two_pairs() {
        let v = silhouette(&two_pairs(), &[0, 0, 1, 1], 2).unwrap();
        assert!((v - 0.921_432_953_789_736_3).abs() < 1e-12, "{v}");
    }

    #[test]
    fn test_singleton_cluster() {
        let data = line(&[0.0, 1.0, 4.0]);
        let labels = [0, 0, 1];

        let s = silhouette(&data, &labels, 2).unwrap();
        assert!((s - (0.75 + 2.0 / 3.0) / 3.0).abs() < 1e-12, "{s}");

        let db = davies_bouldin(&data, &labels, 2).unwrap();
        assert!((db - 0.5 / 3.5).abs() < 1e-12, "{db}");
    }

    #[test]
    fn test_bad_split_scores_worse() {
        let data = two_pairs();
        let good = silhouette(&data, &[0, 0, 1, 1], 2).unwrap();
        let bad = silhouette(&data, &[0, 1, 0, 1], 2).unwrap();
        assert!(bad < 0.0);
        assert!(good > bad);

        let good_db = davies_bouldin(&data, &[0, 0, 1, 1], 2).unwrap();
        let bad_db = davies_bouldin(&data, &[0, 1, 0, 1], 2).unwrap();
        assert!(good_db < bad_db);
    }

    #[test]
    fn test_degenerate_inputs() {
        let data = two_pairs();
        assert!(matches!(
            davies_bouldin(&data, &[0, 0, 0, 0], 2),
            Err(Error::DegenerateClustering { k: 2, non_empty: 1 })
        ));
        assert!(matches!(
            silhouette(&data, &[0, 0, 0, 0], 1),
            Err(Error::DegenerateClustering { k: 1, .. })
        ));
        assert!(matches!(
            silhouette(&data, &[0, 1, 2, 3], 4),
            Err(Error::DegenerateClustering { k: 4, .. })
        ));
        assert!(matches!(
            davies_bouldin(&data, &[0, 1], 2),
            Err(Error::DimensionMismatch { expected: 4, found: 2 })
        ));
        assert!(davies_bouldin(&data, &[0, 0, 1, 5], 2).is_err());
    }

    #[test]
    fn test_coincident_points_score_zero() {
        let data = line(&[2.0, 2.0, 2.0, 2.0]);
        assert_eq!(davies_bouldin(&data, &[0, 0, 1, 1], 2).unwrap(), 0.0);
        assert_eq!(silhouette(&data, &[0, 0, 1, 1], 2).unwrap(), 0.0);
    }

    proptest! {
        #[test]
        fn metric_ranges_hold(
            points in proptest::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 6..40),
        ) {
            let rows: Vec<Vec<f64>> = points.iter().map(|&(a, b)| vec![a, b]).collect();
            let data = FeatureMatrix::from_rows(vec![Column::Height, Column::TrunkDiameter], &rows).unwrap();
            // Round-robin labels keep every cluster populated.
            let labels: Vec<usize> = (0..rows.len()).map(|i| i % 3).collect();

            let db = davies_bouldin(&data, &labels, 3).unwrap();
            let s = silhouette(&data, &labels, 3).unwrap();
            let w = inertia(&data, &labels, 3).unwrap();

            prop_assert!(db >= 0.0);
            prop_assert!((-1.0..=1.0).contains(&s));
            prop_assert!(w >= 0.0);
        }
    }
}
