//! Learned models used by the recommendation engine
//!
//! Each model role has its own narrow interface: the suitability classifier,
//! the yield regressor, and the soil health clusterer share nothing beyond
//! being fitted offline and queried read-only while serving.

pub mod forest;
pub mod kmeans;
pub mod scaler;
pub mod tree;

pub use forest::{ForestConfig, RandomForestClassifier, RandomForestRegressor};
pub use kmeans::{KMeans, KMeansConfig};
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, TreeConfig};

use crate::error::AppResult;

/// Binary classifier predicting whether a crop is recommended
pub trait Classifier: Send + Sync {
    /// Fit on feature rows and 0/1 labels
    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> AppResult<()>;

    /// Probability of the positive class for one feature row
    fn predict_proba(&self, features: &[f64]) -> AppResult<f64>;
}

/// Regressor predicting expected yield
pub trait Regressor: Send + Sync {
    /// Fit on feature rows and continuous targets
    fn fit(&mut self, features: &[Vec<f64>], targets: &[f64]) -> AppResult<()>;

    /// Predicted target for one feature row
    fn predict(&self, features: &[f64]) -> AppResult<f64>;
}

/// Unsupervised clusterer over nutrient vectors
pub trait Clusterer: Send + Sync {
    /// Fit on points and return each point's cluster assignment
    fn fit(&mut self, points: &[Vec<f64>]) -> AppResult<Vec<usize>>;

    /// Cluster id of one point
    fn predict(&self, point: &[f64]) -> AppResult<usize>;

    /// Cluster centres, indexed by cluster id
    fn centroids(&self) -> &[Vec<f64>];
}

/// Fraction of predictions equal to their labels
pub fn accuracy(predicted: &[u8], actual: &[u8]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}

/// Root mean squared error
pub fn rmse(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mse = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}

/// Coefficient of determination
pub fn r2_score(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (a - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
