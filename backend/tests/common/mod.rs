//! Test doubles shared by the integration tests

#![allow(dead_code)]

use crop_advisor_backend::artifacts::{BundleMetadata, ModelBundle, TrainingReport};
use crop_advisor_backend::error::AppResult;
use crop_advisor_backend::features::{FeatureEngineer, FEATURE_COUNT};
use crop_advisor_backend::ml::{Classifier, KMeans, Regressor, StandardScaler};
use crop_advisor_backend::services::SoilHealthModel;

/// Classifier that always returns the same probability
pub struct FixedClassifier(pub f64);

impl Classifier for FixedClassifier {
    fn fit(&mut self, _features: &[Vec<f64>], _labels: &[u8]) -> AppResult<()> {
        Ok(())
    }

    fn predict_proba(&self, _features: &[f64]) -> AppResult<f64> {
        Ok(self.0)
    }
}

/// Regressor that always returns the same yield
pub struct FixedRegressor(pub f64);

impl Regressor for FixedRegressor {
    fn fit(&mut self, _features: &[Vec<f64>], _targets: &[f64]) -> AppResult<()> {
        Ok(())
    }

    fn predict(&self, _features: &[f64]) -> AppResult<f64> {
        Ok(self.0)
    }
}

/// Soil model with two clusters split at a total of roughly 300 kg/ha
pub fn two_cluster_soil_model() -> SoilHealthModel {
    let scaler = StandardScaler::fit(&[vec![0.0, 0.0, 0.0], vec![200.0, 200.0, 200.0]])
        .expect("scaler");
    let kmeans = KMeans::from_centroids(vec![vec![-1.0, -1.0, -1.0], vec![1.0, 1.0, 1.0]])
        .expect("centroids");
    SoilHealthModel::new(scaler, Box::new(kmeans))
}

/// Bundle whose learned parts return fixed outputs
pub fn fake_bundle(confidence: f64, predicted_yield: f64) -> ModelBundle {
    ModelBundle {
        features: FeatureEngineer::default(),
        scaler: StandardScaler::fit(&[vec![0.0; FEATURE_COUNT]]).expect("scaler"),
        classifier: Box::new(FixedClassifier(confidence)),
        regressor: Box::new(FixedRegressor(predicted_yield)),
        soil: two_cluster_soil_model(),
        metadata: BundleMetadata::new(TrainingReport::default()),
    }
}
