//! Merge history of agglomerative clustering.
//!
//! Cluster ids follow the SciPy convention: leaves are `0..n`, and merge `i`
//! creates cluster `n + i`.

use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges, in merge order.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_items: usize,
}

/// One merge: two cluster ids and the dissimilarity that joined them.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Merge {
    cluster_a: usize,
    cluster_b: usize,
    distance: f64,
}

impl Dendrogram {
    /// Create a new dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
        });
    }

    /// Labels for exactly `k` clusters: replay the first `n - k` merges.
    ///
    /// Labels are numbered by first appearance, so item 0 is always in cluster 0.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        if k == 0 || k > self.n_items {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }

        let n_merges = self.n_items - k;
        if n_merges > self.merges.len() {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }

        let mut parent: Vec<usize> = (0..self.n_items + n_merges).collect();
        for (i, merge) in self.merges.iter().take(n_merges).enumerate() {
            let new_id = self.n_items + i;
            let a = find(&mut parent, merge.cluster_a);
            let b = find(&mut parent, merge.cluster_b);
            parent[a] = new_id;
            parent[b] = new_id;
        }

        let mut remap: Vec<Option<usize>> = vec![None; parent.len()];
        let mut next = 0;
        let mut labels = Vec::with_capacity(self.n_items);
        for item in 0..self.n_items {
            let root = find(&mut parent, item);
            let label = *remap[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            labels.push(label);
        }

        Ok(labels)
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Get the merge distances (for visualization).
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn four_leaves() -> Dendrogram {
        //        6
        //       / \
        //      4   5
        //     / \ / \
        //    0  1 2  3
        let mut dendro = Dendrogram::new(4);
        dendro.add_merge(0, 1, 0.5);
        dendro.add_merge(2, 3, 0.7);
        dendro.add_merge(4, 5, 1.0);
        dendro
    }

    #[test]
    fn test_cut_to_k() {
        let dendro = four_leaves();
        assert_eq!(dendro.cut_to_k(4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(dendro.cut_to_k(3).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(dendro.cut_to_k(2).unwrap(), vec![0, 0, 1, 1]);
        assert_eq!(dendro.cut_to_k(1).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_cut_to_k_out_of_range() {
        let dendro = four_leaves();
        assert!(dendro.cut_to_k(0).is_err());
        assert!(dendro.cut_to_k(5).is_err());
    }

    #[test]
    fn test_cut_with_tied_distances() {
        let mut dendro = Dendrogram::new(3);
        dendro.add_merge(0, 1, 1.0);
        dendro.add_merge(2, 3, 1.0);
        assert_eq!(dendro.cut_to_k(2).unwrap(), vec![0, 0, 1]);
        assert_eq!(dendro.distances(), vec![1.0, 1.0]);
    }
}
