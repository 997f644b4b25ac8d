//! Model bundle persistence and training tests
//!
//! - A complete bundle round-trips through disk
//! - Missing files put the engine into fallback mode
//! - Corrupt files are rejected without replacing a working bundle

use std::fs;

use crop_advisor_backend::artifacts::{missing_files, ModelBundle, TrainedArtifacts, BUNDLE_FILES, SCALER_FILE};
use crop_advisor_backend::config::TrainingConfig;
use crop_advisor_backend::training::{synthetic_dataset, train_bundle, LabelSource};
use crop_advisor_backend::RecommendationEngine;
use shared::{ModelVersion, SoilSample, WeatherContext};

fn small_config() -> TrainingConfig {
    TrainingConfig {
        samples: 150,
        seed: 7,
        n_trees: 5,
        max_depth: 6,
        cv_folds: 2,
    }
}

fn trained() -> TrainedArtifacts {
    let config = small_config();
    let rows = synthetic_dataset(config.samples, config.seed);
    train_bundle(&rows, &config).expect("training succeeds")
}

#[test]
fn empty_directory_has_no_bundle() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(missing_files(dir.path()).len(), BUNDLE_FILES.len());
    assert!(ModelBundle::load(dir.path()).unwrap().is_none());

    let engine = RecommendationEngine::load(dir.path());
    assert_eq!(engine.model_version(), ModelVersion::Fallback);
}

#[test]
fn training_report_is_filled_in() {
    let artifacts = trained();
    let report = &artifacts.metadata.report;
    assert_eq!(report.samples, 150);
    assert!((0.0..=1.0).contains(&report.classifier_accuracy));
    assert!((0.0..=1.0).contains(&report.cv_accuracy_mean));
    assert!(report.regressor_rmse >= 0.0);
    assert_eq!(report.soil_health_labels.len(), 5);
    assert_eq!(report.estimated_yield_labels, 0);
    assert!(!report.feature_importances.is_empty());
    assert!(report
        .feature_importances
        .windows(2)
        .all(|w| w[0].importance >= w[1].importance));
}

#[test]
fn saved_bundle_loads_and_serves() {
    let dir = tempfile::tempdir().unwrap();
    let artifacts = trained();
    let bundle_id = artifacts.metadata.bundle_id;
    artifacts.save(dir.path()).unwrap();
    assert!(missing_files(dir.path()).is_empty());

    let engine = RecommendationEngine::load(dir.path());
    assert!(engine.is_trained());
    assert_eq!(engine.metadata().map(|m| m.bundle_id), Some(bundle_id));

    let sample = SoilSample::new(140.0, 75.0, 60.0).with_district("Ludhiana");
    let report = engine
        .full_report(&sample, &WeatherContext::default(), "Ludhiana")
        .unwrap();
    assert_eq!(report.model_version, ModelVersion::Trained);
    assert_eq!(report.value.recommendations.len(), 4);
    assert!(report.value.soil_health.cluster.is_some());
    for rec in &report.value.recommendations {
        assert!((0.0..=1.0).contains(&rec.recommendation_confidence));
        assert!(rec.predicted_yield >= 0.0);
    }
}

#[test]
fn removing_one_file_disables_the_bundle() {
    let dir = tempfile::tempdir().unwrap();
    trained().save(dir.path()).unwrap();
    fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();

    assert!(ModelBundle::load(dir.path()).unwrap().is_none());
    assert!(!RecommendationEngine::load(dir.path()).is_trained());
}

#[test]
fn corrupt_file_keeps_current_bundle() {
    let good = tempfile::tempdir().unwrap();
    let artifacts = trained();
    let bundle_id = artifacts.metadata.bundle_id;
    artifacts.save(good.path()).unwrap();

    let bad = tempfile::tempdir().unwrap();
    trained().save(bad.path()).unwrap();
    fs::write(bad.path().join(SCALER_FILE), b"{ not json").unwrap();

    // Startup with a corrupt bundle still comes up in fallback mode
    assert!(!RecommendationEngine::load(bad.path()).is_trained());

    let engine = RecommendationEngine::load(good.path());
    assert!(engine.reload(bad.path()).is_err());
    assert_eq!(engine.metadata().map(|m| m.bundle_id), Some(bundle_id));

    let empty = tempfile::tempdir().unwrap();
    assert!(!engine.reload(empty.path()).unwrap());
    assert!(engine.is_trained());
}

#[test]
fn reload_installs_a_new_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let engine = RecommendationEngine::fallback();
    trained().save(dir.path()).unwrap();
    assert!(engine.reload(dir.path()).unwrap());
    assert_eq!(engine.model_version(), ModelVersion::Trained);
}

#[test]
fn synthetic_rows_are_measured() {
    let rows = synthetic_dataset(50, 1);
    assert!(rows.iter().all(|r| r.label_source == LabelSource::Measured));
    assert!(rows.iter().all(|r| r.recommended == u8::from(r.suitability >= 0.7)));
}
