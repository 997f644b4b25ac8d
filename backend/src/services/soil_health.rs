//! Soil health clustering and cluster labelling

use shared::{HealthStatus, SoilHealthReport, SoilSample};

use crate::error::{AppError, AppResult};
use crate::ml::{Clusterer, StandardScaler};

/// Ordinal health label for each cluster id.
///
/// Clusters are ranked by the mean of their (scaled) centroid coordinates, so
/// the lowest-nutrient cluster is always `Poor` and the highest `Excellent`
/// whatever ids k-means happened to assign.
pub fn rank_cluster_labels(centroids: &[Vec<f64>]) -> Vec<HealthStatus> {
    let mean = |c: &Vec<f64>| {
        if c.is_empty() {
            0.0
        } else {
            c.iter().sum::<f64>() / c.len() as f64
        }
    };

    let mut order: Vec<usize> = (0..centroids.len()).collect();
    order.sort_by(|&a, &b| mean(&centroids[a]).total_cmp(&mean(&centroids[b])));

    let levels = HealthStatus::ALL.len();
    let mut labels = vec![HealthStatus::Average; centroids.len()];
    for (rank, &cluster) in order.iter().enumerate() {
        labels[cluster] = HealthStatus::ALL[rank * levels / centroids.len()];
    }
    labels
}

/// Clusterer over standard-scaled NPK with its label mapping
pub struct SoilHealthModel {
    scaler: StandardScaler,
    clusterer: Box<dyn Clusterer>,
    labels: Vec<HealthStatus>,
}

impl SoilHealthModel {
    /// Wrap a fitted clusterer, deriving labels from its centroids
    pub fn new(scaler: StandardScaler, clusterer: Box<dyn Clusterer>) -> Self {
        let labels = rank_cluster_labels(clusterer.centroids());
        Self {
            scaler,
            clusterer,
            labels,
        }
    }

    /// Wrap a fitted clusterer with a stored label mapping
    pub fn with_labels(
        scaler: StandardScaler,
        clusterer: Box<dyn Clusterer>,
        labels: Vec<HealthStatus>,
    ) -> AppResult<Self> {
        if labels.len() != clusterer.centroids().len() {
            return Err(AppError::Artifact(format!(
                "{} soil health labels for {} clusters",
                labels.len(),
                clusterer.centroids().len()
            )));
        }
        Ok(Self {
            scaler,
            clusterer,
            labels,
        })
    }

    pub fn labels(&self) -> &[HealthStatus] {
        &self.labels
    }

    pub fn analyze(&self, sample: &SoilSample) -> AppResult<SoilHealthReport> {
        let npk = sample.npk();
        let scaled = self.scaler.transform(&npk.to_array())?;
        let cluster = self.clusterer.predict(&scaled)?;
        let status = self.labels.get(cluster).copied().ok_or_else(|| {
            AppError::ModelInference(format!("cluster {} has no health label", cluster))
        })?;
        Ok(SoilHealthReport::for_cluster(status, cluster, npk.total()))
    }
}
