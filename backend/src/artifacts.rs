//! Trained model bundle and its on-disk layout
//!
//! A bundle is a directory of JSON files, one per fitted component. Loading
//! is all-or-nothing: if any file is missing the bundle is absent and the
//! engine serves formula-only results.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::HealthStatus;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::features::FeatureEngineer;
use crate::ml::{Classifier, KMeans, RandomForestClassifier, RandomForestRegressor, Regressor, StandardScaler};
use crate::services::soil_health::SoilHealthModel;

pub const CLASSIFIER_FILE: &str = "crop_recommender.json";
pub const REGRESSOR_FILE: &str = "yield_predictor.json";
pub const CLUSTERER_FILE: &str = "soil_classifier.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const SOIL_SCALER_FILE: &str = "soil_scaler.json";
pub const ENCODERS_FILE: &str = "label_encoders.json";
pub const SOIL_LABELS_FILE: &str = "soil_health_labels.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Every file a complete bundle contains
pub const BUNDLE_FILES: [&str; 8] = [
    CLASSIFIER_FILE,
    REGRESSOR_FILE,
    CLUSTERER_FILE,
    SCALER_FILE,
    SOIL_SCALER_FILE,
    ENCODERS_FILE,
    SOIL_LABELS_FILE,
    METADATA_FILE,
];

/// Importance of one feature column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Evaluation figures captured while training a bundle
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub samples: usize,
    pub classifier_accuracy: f64,
    pub cv_accuracy_mean: f64,
    pub cv_accuracy_std: f64,
    /// Most important classifier features, highest first
    pub feature_importances: Vec<FeatureImportance>,
    pub regressor_rmse: f64,
    pub regressor_r2: f64,
    /// Health label per cluster id
    pub soil_health_labels: Vec<HealthStatus>,
    /// Rows whose yield label was estimated rather than measured
    pub estimated_yield_labels: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BundleMetadata {
    pub bundle_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub report: TrainingReport,
}

impl BundleMetadata {
    pub fn new(report: TrainingReport) -> Self {
        Self {
            bundle_id: Uuid::new_v4(),
            created_at: Utc::now(),
            report,
        }
    }
}

/// Concrete fitted components, as written to and read from disk
#[derive(Debug, Clone)]
pub struct TrainedArtifacts {
    pub features: FeatureEngineer,
    pub scaler: StandardScaler,
    pub classifier: RandomForestClassifier,
    pub regressor: RandomForestRegressor,
    pub soil_scaler: StandardScaler,
    pub clusterer: KMeans,
    pub soil_labels: Vec<HealthStatus>,
    pub metadata: BundleMetadata,
}

fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) -> AppResult<()> {
    let path = dir.join(file);
    let json = serde_json::to_vec(value)?;
    fs::write(&path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> AppResult<T> {
    let path = dir.join(file);
    let bytes = fs::read(&path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::Artifact(format!("{}: {}", path.display(), e)))
}

/// Files of the bundle at `dir` that do not exist
pub fn missing_files(dir: &Path) -> Vec<PathBuf> {
    BUNDLE_FILES
        .iter()
        .map(|f| dir.join(f))
        .filter(|p| !p.is_file())
        .collect()
}

impl TrainedArtifacts {
    /// Write every component into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir)?;
        write_json(dir, ENCODERS_FILE, &self.features)?;
        write_json(dir, SCALER_FILE, &self.scaler)?;
        write_json(dir, CLASSIFIER_FILE, &self.classifier)?;
        write_json(dir, REGRESSOR_FILE, &self.regressor)?;
        write_json(dir, SOIL_SCALER_FILE, &self.soil_scaler)?;
        write_json(dir, CLUSTERER_FILE, &self.clusterer)?;
        write_json(dir, SOIL_LABELS_FILE, &self.soil_labels)?;
        // Metadata last, so a crash mid-save leaves an incomplete bundle
        write_json(dir, METADATA_FILE, &self.metadata)?;
        tracing::info!(dir = %dir.display(), bundle_id = %self.metadata.bundle_id, "Model bundle saved");
        Ok(())
    }

    /// Read a bundle from `dir`.
    ///
    /// Returns `Ok(None)` when any file is missing and an error when a file
    /// exists but cannot be parsed.
    pub fn load(dir: &Path) -> AppResult<Option<Self>> {
        let missing = missing_files(dir);
        if !missing.is_empty() {
            tracing::debug!(dir = %dir.display(), missing = missing.len(), "Model bundle incomplete");
            return Ok(None);
        }

        Ok(Some(Self {
            features: read_json(dir, ENCODERS_FILE)?,
            scaler: read_json(dir, SCALER_FILE)?,
            classifier: read_json(dir, CLASSIFIER_FILE)?,
            regressor: read_json(dir, REGRESSOR_FILE)?,
            soil_scaler: read_json(dir, SOIL_SCALER_FILE)?,
            clusterer: read_json(dir, CLUSTERER_FILE)?,
            soil_labels: read_json(dir, SOIL_LABELS_FILE)?,
            metadata: read_json(dir, METADATA_FILE)?,
        }))
    }
}

/// Everything the engine needs to serve trained predictions.
///
/// Immutable once built; the engine replaces it whole.
pub struct ModelBundle {
    pub features: FeatureEngineer,
    pub scaler: StandardScaler,
    pub classifier: Box<dyn Classifier>,
    pub regressor: Box<dyn Regressor>,
    pub soil: SoilHealthModel,
    pub metadata: BundleMetadata,
}

impl TryFrom<TrainedArtifacts> for ModelBundle {
    type Error = AppError;

    fn try_from(artifacts: TrainedArtifacts) -> AppResult<Self> {
        if !artifacts.classifier.is_fitted() || !artifacts.regressor.is_fitted() {
            return Err(AppError::Artifact("bundle contains an unfitted model".into()));
        }
        let soil = SoilHealthModel::with_labels(
            artifacts.soil_scaler,
            Box::new(artifacts.clusterer),
            artifacts.soil_labels,
        )?;
        Ok(Self {
            features: artifacts.features,
            scaler: artifacts.scaler,
            classifier: Box::new(artifacts.classifier),
            regressor: Box::new(artifacts.regressor),
            soil,
            metadata: artifacts.metadata,
        })
    }
}

impl ModelBundle {
    /// Load and assemble the bundle at `dir`; `Ok(None)` if it is incomplete
    pub fn load(dir: &Path) -> AppResult<Option<Self>> {
        TrainedArtifacts::load(dir)?
            .map(ModelBundle::try_from)
            .transpose()
    }
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("bundle_id", &self.metadata.bundle_id)
            .field("created_at", &self.metadata.created_at)
            .finish_non_exhaustive()
    }
}
