//! Seeded k-means (Lloyd iterations, k-means++ seeding).
//!
//! A fit minimizes the within-cluster sum of squared distances and returns it
//! as the inertia:
//!
//! ```text
//! inertia = Σ_c Σ_{x ∈ c} ||x - centroid(c)||²
//! ```
//!
//! One run seeds k centroids with k-means++ (first centroid uniform, each next
//! one drawn with weight equal to its squared distance to the closest chosen
//! centroid), then alternates assignment and mean updates until the summed
//! squared centroid movement drops below `tol` or `max_iter` is reached.
//!
//! `n_init` runs draw from a single seeded stream; the lowest inertia wins and
//! the earliest run wins ties, so a fixed seed reproduces the fit exactly.
//!
//! A cluster that empties during an update takes over the point lying farthest
//! from its current centroid. Duplicated rows can still leave a cluster empty
//! at the end; [`KmeansFit::non_empty_clusters`] reports how many survived.

use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::features::FeatureMatrix;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::prelude::*;

/// Seeded k-means configuration.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum Lloyd iterations per run.
    max_iter: usize,
    /// Convergence tolerance on total squared centroid shift.
    tol: f64,
    /// Independent k-means++ restarts.
    n_init: usize,
    /// Random seed.
    seed: Option<u64>,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster label per row, in `[0, k)`.
    pub labels: Vec<usize>,
    /// Final centroids, shape (k, d).
    pub centroids: Array2<f64>,
    /// Sum of squared distances from each row to its assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations used by the kept run.
    pub n_iter: usize,
}

impl KmeansFit {
    /// Number of clusters that received at least one point.
    pub fn non_empty_clusters(&self) -> usize {
        let mut seen = vec![false; self.centroids.nrows()];
        for &l in &self.labels {
            seen[l] = true;
        }
        seen.into_iter().filter(|&s| s).count()
    }
}

impl Kmeans {
    /// k clusters with the default iteration budget and 10 unseeded restarts.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 10,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fit and return labels, centroids and inertia.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<KmeansFit> {
        let n = data.n_rows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }

        let x = data.view();
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut best: Option<KmeansFit> = None;
        for run in 0..self.n_init.max(1) {
            let fit = self.run_once(&x, &mut rng);
            tracing::trace!(k = self.k, run, inertia = fit.inertia, n_iter = fit.n_iter, "k-means run");
            let better = best.as_ref().is_none_or(|b| fit.inertia < b.inertia);
            if better {
                best = Some(fit);
            }
        }

        best.ok_or(Error::EmptyInput)
    }

    /// One k-means++ initialization followed by Lloyd iterations.
    fn run_once(&self, x: &ArrayView2<'_, f64>, rng: &mut impl Rng) -> KmeansFit {
        let mut centroids = self.init_centroids(x, rng);
        let mut labels = vec![0usize; x.nrows()];
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            n_iter = iter + 1;
            Self::assign(x, &centroids, &mut labels);
            let new_centroids = self.update(x, &centroids, &labels);

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift < self.tol {
                break;
            }
        }

        // Labels must agree with the centroids that are returned.
        Self::assign(x, &centroids, &mut labels);
        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &l)| Self::squared_distance(&x.row(i), &centroids.row(l)))
            .sum();

        KmeansFit {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_centroids(&self, data: &ArrayView2<'_, f64>, rng: &mut impl Rng) -> Array2<f64> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        // First centroid: random point
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Remaining centroids: k-means++ selection
        for i in 1..self.k {
            let distances: Vec<f64> = (0..n)
                .map(|j| {
                    let point = data.row(j);
                    (0..i)
                        .map(|c| Self::squared_distance(&point, &centroids.row(c)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            // Sample proportional to squared distance
            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = distances.iter().rposition(|&d| d > 0.0).unwrap_or(n - 1);

            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if d > 0.0 && cumsum >= threshold {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }

    /// Nearest-centroid assignment; ties go to the lower cluster index.
    fn assign(x: &ArrayView2<'_, f64>, centroids: &Array2<f64>, labels: &mut [usize]) {
        for (i, label) in labels.iter_mut().enumerate() {
            let point = x.row(i);
            let mut best_cluster = 0;
            let mut best_dist = f64::MAX;

            for k in 0..centroids.nrows() {
                let dist = Self::squared_distance(&point, &centroids.row(k));
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = k;
                }
            }
            *label = best_cluster;
        }
    }

    /// Recompute centroids as cluster means, relocating empty clusters.
    fn update(&self, x: &ArrayView2<'_, f64>, old: &Array2<f64>, labels: &[usize]) -> Array2<f64> {
        let d = x.ncols();
        let mut new_centroids = Array2::zeros((self.k, d));
        let mut counts = vec![0usize; self.k];

        for (i, &k) in labels.iter().enumerate() {
            let mut row = new_centroids.row_mut(k);
            row += &x.row(i);
            counts[k] += 1;
        }

        let empty: Vec<usize> = (0..self.k).filter(|&k| counts[k] == 0).collect();

        for k in 0..self.k {
            if counts[k] > 0 {
                let mut row = new_centroids.row_mut(k);
                row /= counts[k] as f64;
            }
        }

        if !empty.is_empty() {
            tracing::warn!(k = self.k, empty = empty.len(), "relocating empty clusters");

            // Farthest points first, never reusing a point.
            let mut order: Vec<(usize, f64)> = labels
                .iter()
                .enumerate()
                .map(|(i, &l)| (i, Self::squared_distance(&x.row(i), &old.row(l))))
                .collect();
            order.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

            for (&k, &(i, _)) in empty.iter().zip(order.iter()) {
                new_centroids.row_mut(k).assign(&x.row(i));
            }
        }

        new_centroids
    }

    /// Compute squared Euclidean distance.
    fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}
