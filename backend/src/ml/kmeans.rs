//! K-means clustering
//!
//! Lloyd's algorithm with k-means++ seeding and several restarts, keeping the
//! run with the lowest inertia (sum of squared distances to the assigned
//! centroid). Deterministic for a given seed.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Clusterer;
use crate::error::{AppError, AppResult};

/// K-means hyper-parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansConfig {
    pub n_clusters: usize,
    /// Independent restarts; the lowest-inertia run wins
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on total squared centroid movement
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// A fitted (or empty) k-means model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    config: KMeansConfig,
    centroids: Vec<Vec<f64>>,
    inertia: f64,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of the nearest centroid and the squared distance to it
fn nearest(centroids: &[Vec<f64>], point: &[f64]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(idx, centroid)| (idx, squared_distance(centroid, point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, f64::INFINITY))
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self {
            config,
            centroids: Vec::new(),
            inertia: 0.0,
        }
    }

    /// Model with fixed centroids, for callers that already know the centres
    pub fn from_centroids(centroids: Vec<Vec<f64>>) -> AppResult<Self> {
        let width = centroids.first().map(Vec::len).unwrap_or(0);
        if width == 0 || centroids.iter().any(|c| c.len() != width) {
            return Err(AppError::Artifact("centroids must be non-empty and equal width".into()));
        }
        Ok(Self {
            config: KMeansConfig {
                n_clusters: centroids.len(),
                ..KMeansConfig::default()
            },
            centroids,
            inertia: 0.0,
        })
    }

    pub fn n_clusters(&self) -> usize {
        self.config.n_clusters
    }

    /// Sum of squared distances of training points to their centroid
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    /// k-means++ seeding: each new centre is drawn with probability
    /// proportional to its squared distance from the nearest chosen centre
    fn seed_centroids(&self, points: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let k = self.config.n_clusters;
        let mut centroids = Vec::with_capacity(k);
        centroids.push(points[rng.gen_range(0..points.len())].clone());

        while centroids.len() < k {
            let distances: Vec<f64> = points.iter().map(|p| nearest(&centroids, p).1).collect();
            let next = match WeightedIndex::new(&distances) {
                Ok(dist) => dist.sample(rng),
                // Every point coincides with a centre already
                Err(_) => rng.gen_range(0..points.len()),
            };
            centroids.push(points[next].clone());
        }
        centroids
    }

    /// One seeded run of Lloyd's algorithm
    fn run_once(&self, points: &[Vec<f64>], rng: &mut StdRng) -> (Vec<Vec<f64>>, Vec<usize>, f64) {
        let width = points[0].len();
        let mut centroids = self.seed_centroids(points, rng);
        let mut assignments = vec![0usize; points.len()];

        for _ in 0..self.config.max_iter {
            for (slot, point) in assignments.iter_mut().zip(points) {
                *slot = nearest(&centroids, point).0;
            }

            let mut sums = vec![vec![0.0; width]; centroids.len()];
            let mut counts = vec![0usize; centroids.len()];
            for (&cluster, point) in assignments.iter().zip(points) {
                counts[cluster] += 1;
                for (s, v) in sums[cluster].iter_mut().zip(point) {
                    *s += v;
                }
            }

            let mut shift = 0.0;
            for cluster in 0..centroids.len() {
                let updated = if counts[cluster] == 0 {
                    // Re-seed an empty cluster at the point farthest from its centre
                    let (farthest, _) = points
                        .iter()
                        .enumerate()
                        .map(|(i, p)| (i, squared_distance(p, &centroids[assignments[i]])))
                        .max_by(|a, b| a.1.total_cmp(&b.1))
                        .unwrap_or((0, 0.0));
                    points[farthest].clone()
                } else {
                    sums[cluster]
                        .iter()
                        .map(|s| s / counts[cluster] as f64)
                        .collect()
                };
                shift += squared_distance(&updated, &centroids[cluster]);
                centroids[cluster] = updated;
            }

            if shift <= self.config.tolerance {
                break;
            }
        }

        let mut inertia = 0.0;
        for (slot, point) in assignments.iter_mut().zip(points) {
            let (cluster, distance) = nearest(&centroids, point);
            *slot = cluster;
            inertia += distance;
        }
        (centroids, assignments, inertia)
    }
}

impl Clusterer for KMeans {
    fn fit(&mut self, points: &[Vec<f64>]) -> AppResult<Vec<usize>> {
        let k = self.config.n_clusters;
        if k == 0 {
            return Err(AppError::Training("k-means needs at least one cluster".into()));
        }
        if points.len() < k {
            return Err(AppError::Training(format!(
                "k-means needs at least {} points, got {}",
                k,
                points.len()
            )));
        }
        let width = points[0].len();
        if width == 0 || points.iter().any(|p| p.len() != width) {
            return Err(AppError::Training("points must be non-empty and equal width".into()));
        }
        if points.iter().flatten().any(|v| !v.is_finite()) {
            return Err(AppError::Training("points contain non-finite values".into()));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<(Vec<Vec<f64>>, Vec<usize>, f64)> = None;
        for _ in 0..self.config.n_init.max(1) {
            let run = self.run_once(points, &mut rng);
            if best.as_ref().map_or(true, |b| run.2 < b.2) {
                best = Some(run);
            }
        }

        let (centroids, assignments, inertia) =
            best.ok_or_else(|| AppError::Training("k-means produced no run".into()))?;
        tracing::debug!(inertia, "k-means fitted");
        self.centroids = centroids;
        self.inertia = inertia;
        Ok(assignments)
    }

    fn predict(&self, point: &[f64]) -> AppResult<usize> {
        let expected = self.centroids.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(AppError::ModelInference("clusterer is not fitted".into()));
        }
        if point.len() != expected {
            return Err(AppError::ModelInference(format!(
                "clusterer expects {} features, got {}",
                expected,
                point.len()
            )));
        }
        Ok(nearest(&self.centroids, point).0)
    }

    fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        let centres = [(0.0, 0.0), (10.0, 10.0), (-10.0, 10.0)];
        let mut points = Vec::new();
        for (cx, cy) in centres {
            for i in 0..10 {
                let offset = (i as f64 - 4.5) * 0.1;
                points.push(vec![cx + offset, cy - offset]);
            }
        }
        points
    }

    #[test]
    fn recovers_well_separated_blobs() {
        let points = blobs();
        let mut model = KMeans::new(KMeansConfig {
            n_clusters: 3,
            ..KMeansConfig::default()
        });
        let assignments = model.fit(&points).unwrap();

        for group in assignments.chunks(10) {
            assert!(group.iter().all(|&c| c == group[0]));
        }
        assert_ne!(assignments[0], assignments[10]);
        assert_ne!(assignments[10], assignments[20]);
        assert_eq!(model.predict(&[9.5, 9.8]).unwrap(), assignments[10]);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let mut model = KMeans::new(KMeansConfig::default());
        assert!(model.fit(&[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn duplicate_points_still_fit() {
        let points = vec![vec![1.0, 1.0]; 6];
        let mut model = KMeans::new(KMeansConfig::default());
        let assignments = model.fit(&points).unwrap();
        assert_eq!(assignments.len(), 6);
        assert_eq!(model.centroids().len(), 5);
    }

    #[test]
    fn predict_checks_width() {
        let model = KMeans::from_centroids(vec![vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        assert_eq!(model.predict(&[0.9, 0.8]).unwrap(), 1);
        assert!(matches!(model.predict(&[0.9]), Err(AppError::ModelInference(_))));
    }
}
