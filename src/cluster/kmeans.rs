//! K-means (Lloyd's algorithm) with k-means++ initialization
//!
//! Deterministic for a given seed. Ties in the assignment step go to the
//! lower-indexed centroid; a cluster left empty after reassignment is
//! re-seeded from the point farthest from its own assigned centroid.

use crate::error::{RailflowError, Result};
use ndarray::{Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

/// Fitted k-means partition
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Nearest-centroid label per input row
    pub labels: Vec<usize>,
    /// Final centroids, one row per cluster
    pub centroids: Array2<f64>,
    /// Iterations until convergence (or the cap)
    pub iterations: usize,
}

/// K-means clusterer
#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iter: usize,
    pub seed: u64,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 100,
            seed: 42,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn euclidean_sq(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// Strictly-less comparison keeps the lower index on ties
    fn nearest_centroid(row: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for c in 0..centroids.nrows() {
            let d = Self::euclidean_sq(row, centroids.row(c));
            if d < best_dist {
                best_dist = d;
                best = c;
            }
        }
        best
    }

    /// K-means++: first centroid uniform, the rest weighted by squared
    /// distance to the nearest already-chosen centroid
    fn kmeans_pp_init(x: &Array2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let n = x.nrows();
        let mut centroids = Array2::zeros((k, x.ncols()));

        let first = rng.gen_range(0..n);
        centroids.row_mut(0).assign(&x.row(first));

        for c in 1..k {
            let dists: Vec<f64> = (0..n)
                .map(|i| {
                    (0..c)
                        .map(|j| Self::euclidean_sq(x.row(i), centroids.row(j)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = dists.iter().sum();
            if total <= 0.0 {
                // All points coincide with existing centroids
                let idx = rng.gen_range(0..n);
                centroids.row_mut(c).assign(&x.row(idx));
                continue;
            }

            let target = rng.gen_range(0.0..total);
            let mut cumulative = 0.0;
            let mut chosen = n - 1;
            for (i, &d) in dists.iter().enumerate() {
                cumulative += d;
                if cumulative >= target {
                    chosen = i;
                    break;
                }
            }
            centroids.row_mut(c).assign(&x.row(chosen));
        }

        centroids
    }

    /// Partition the rows of `x` into `n_clusters` groups.
    ///
    /// Fails fast when k = 0 or k exceeds the number of points.
    pub fn fit(&self, x: &Array2<f64>) -> Result<KMeansFit> {
        let n = x.nrows();
        if self.n_clusters == 0 {
            return Err(RailflowError::InvalidArgument(
                "cluster count k must be at least 1".to_string(),
            ));
        }
        if n < self.n_clusters {
            return Err(RailflowError::InvalidArgument(format!(
                "cluster count k ({}) exceeds number of points ({})",
                self.n_clusters, n
            )));
        }

        let k = self.n_clusters;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut centroids = Self::kmeans_pp_init(x, k, &mut rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;

            // Assignment step (parallel over points)
            let new_labels: Vec<usize> = (0..n)
                .into_par_iter()
                .map(|i| Self::nearest_centroid(x.row(i), &centroids))
                .collect();

            let changed = new_labels
                .iter()
                .zip(labels.iter())
                .filter(|(a, b)| a != b)
                .count();
            labels = new_labels;

            // Update step
            let mut sums = Array2::<f64>::zeros((k, x.ncols()));
            let mut counts = vec![0usize; k];
            for (i, &label) in labels.iter().enumerate() {
                counts[label] += 1;
                let mut row = sums.row_mut(label);
                row += &x.row(i);
            }

            for c in 0..k {
                if counts[c] > 0 {
                    let mut row = sums.row_mut(c);
                    row /= counts[c] as f64;
                } else {
                    // Re-seed from the point farthest from its own centroid
                    let farthest = (0..n)
                        .max_by(|&a, &b| {
                            let da = Self::euclidean_sq(x.row(a), centroids.row(labels[a]));
                            let db = Self::euclidean_sq(x.row(b), centroids.row(labels[b]));
                            da.total_cmp(&db)
                        })
                        .unwrap_or(0);
                    sums.row_mut(c).assign(&x.row(farthest));
                }
            }
            centroids = sums;

            if changed == 0 && iter > 0 {
                break;
            }
        }

        // Final assignment against the final centroids, so returned
        // memberships always match the returned centroids
        let labels: Vec<usize> = (0..n)
            .into_par_iter()
            .map(|i| Self::nearest_centroid(x.row(i), &centroids))
            .collect();

        debug!(k, n, iterations, "k-means converged");
        Ok(KMeansFit {
            labels,
            centroids,
            iterations,
        })
    }
}

/// Mean silhouette coefficient over all points: for each point,
/// `(b − a) / max(a, b)` with `a` the mean intra-cluster distance and
/// `b` the mean distance to the nearest other cluster. Returns 0 for a
/// single cluster or a single point.
pub fn silhouette_score(x: &Array2<f64>, labels: &[usize], k: usize) -> f64 {
    let n = x.nrows();
    if n < 2 || k < 2 {
        return 0.0;
    }

    let dist = |a: usize, b: usize| -> f64 {
        x.row(a)
            .iter()
            .zip(x.row(b).iter())
            .map(|(p, q)| (p - q).powi(2))
            .sum::<f64>()
            .sqrt()
    };

    let scores: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| {
            let own = labels[i];
            let mut intra_sum = 0.0;
            let mut intra_count = 0usize;
            let mut other_sums = vec![0.0; k];
            let mut other_counts = vec![0usize; k];

            for j in 0..n {
                if j == i {
                    continue;
                }
                if labels[j] == own {
                    intra_sum += dist(i, j);
                    intra_count += 1;
                } else {
                    other_sums[labels[j]] += dist(i, j);
                    other_counts[labels[j]] += 1;
                }
            }

            let a = if intra_count > 0 {
                intra_sum / intra_count as f64
            } else {
                0.0
            };
            let b = (0..k)
                .filter(|&c| c != own && other_counts[c] > 0)
                .map(|c| other_sums[c] / other_counts[c] as f64)
                .fold(f64::MAX, f64::min);

            if b == f64::MAX {
                return 0.0;
            }
            let denom = a.max(b);
            if denom == 0.0 {
                0.0
            } else {
                (b - a) / denom
            }
        })
        .collect();

    scores.iter().sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_well_separated_clusters() {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [100.0, 100.0],
            [100.0, 101.0],
            [101.0, 100.0],
        ];
        let fit = KMeans::new(2).fit(&x).unwrap();

        assert_eq!(fit.labels.len(), 6);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_eq!(fit.labels[3], fit.labels[5]);
        assert_ne!(fit.labels[0], fit.labels[3]);
    }

    #[test]
    fn test_partition_covers_every_point_once() {
        let x = array![
            [1.0, 2.0],
            [1.5, 1.8],
            [5.0, 8.0],
            [8.0, 8.0],
            [1.0, 0.6],
            [9.0, 11.0],
        ];
        let fit = KMeans::new(3).fit(&x).unwrap();
        assert_eq!(fit.labels.len(), 6);
        for &label in &fit.labels {
            assert!(label < 3);
        }
    }

    #[test]
    fn test_k_validation() {
        let x = array![[1.0], [2.0]];
        assert!(KMeans::new(0).fit(&x).is_err());
        assert!(KMeans::new(3).fit(&x).is_err());
        assert!(KMeans::new(2).fit(&x).is_ok());
    }

    #[test]
    fn test_deterministic_for_a_seed() {
        let x = array![
            [1.0, 2.0],
            [1.5, 1.8],
            [5.0, 8.0],
            [8.0, 8.0],
            [1.0, 0.6],
            [9.0, 11.0],
        ];
        let a = KMeans::new(2).with_seed(7).fit(&x).unwrap();
        let b = KMeans::new(2).with_seed(7).fit(&x).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_k_equals_n_gives_singletons() {
        let x = array![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
        let fit = KMeans::new(3).fit(&x).unwrap();
        let mut sorted = fit.labels.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn test_silhouette_high_for_separated_clusters() {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [100.0, 100.0],
            [100.0, 101.0],
            [101.0, 100.0],
        ];
        let fit = KMeans::new(2).fit(&x).unwrap();
        let score = silhouette_score(&x, &fit.labels, 2);
        assert!(score > 0.9, "expected near-1 silhouette, got {score}");
    }

    #[test]
    fn test_silhouette_single_cluster_is_zero() {
        let x = array![[0.0], [1.0], [2.0]];
        assert_eq!(silhouette_score(&x, &[0, 0, 0], 1), 0.0);
    }
}
