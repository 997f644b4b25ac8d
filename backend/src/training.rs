//! Offline training of the model bundle
//!
//! Synthetic Punjab field data is generated from a seeded RNG, every row
//! carries the provenance of its yield label, and the three models are
//! fitted and evaluated on the same feature derivation the server uses.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use shared::{suitability_score, Crop, SoilSample, WeatherContext, SUITABILITY_THRESHOLD};

use crate::artifacts::{BundleMetadata, FeatureImportance, TrainedArtifacts, TrainingReport};
use crate::config::TrainingConfig;
use crate::error::{AppError, AppResult};
use crate::features::{FeatureEngineer, FEATURE_NAMES};
use crate::ml::{
    accuracy, r2_score, rmse, Classifier, Clusterer, ForestConfig, KMeans, KMeansConfig,
    RandomForestClassifier, RandomForestRegressor, Regressor, StandardScaler,
};
use crate::services::soil_health::rank_cluster_labels;

pub const PUNJAB_DISTRICTS: [&str; 22] = [
    "Amritsar",
    "Barnala",
    "Bathinda",
    "Faridkot",
    "Fatehgarh Sahib",
    "Fazilka",
    "Ferozepur",
    "Gurdaspur",
    "Hoshiarpur",
    "Jalandhar",
    "Kapurthala",
    "Ludhiana",
    "Mansa",
    "Moga",
    "Muktsar",
    "Pathankot",
    "Patiala",
    "Rupnagar",
    "SAS Nagar",
    "Sangrur",
    "Shahid Bhagat Singh Nagar",
    "Tarn Taran",
];

pub const SOIL_TYPES: [&str; 6] = ["loamy", "clayey", "sandy", "black", "red", "alluvial"];

const TEST_FRACTION: f64 = 0.2;
const TOP_IMPORTANCES: usize = 10;

/// Where a row's yield label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    Measured,
    /// `base_yield × suitability`, so the regressor partly learns the formula
    EstimatedFromSuitability,
}

/// One labelled training example
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRow {
    pub crop: Crop,
    pub sample: SoilSample,
    pub weather: WeatherContext,
    pub suitability: f64,
    pub recommended: u8,
    pub yield_kg_ha: f64,
    pub label_source: LabelSource,
}

impl TrainingRow {
    /// Label a sample for `crop`, estimating yield when none was measured
    pub fn new(
        crop: Crop,
        sample: SoilSample,
        weather: WeatherContext,
        measured_yield: Option<f64>,
    ) -> Self {
        let suitability = suitability_score(&sample, crop);
        let (yield_kg_ha, label_source) = match measured_yield {
            Some(y) => (y, LabelSource::Measured),
            None => (
                crop.base_yield() * suitability,
                LabelSource::EstimatedFromSuitability,
            ),
        };
        Self {
            crop,
            sample,
            weather,
            suitability,
            recommended: u8::from(suitability >= SUITABILITY_THRESHOLD),
            yield_kg_ha,
            label_source,
        }
    }
}

/// Standard normal draw (Box-Muller)
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Generate `samples` synthetic field records
pub fn synthetic_dataset(samples: usize, seed: u64) -> Vec<TrainingRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..samples)
        .map(|_| {
            let crop = Crop::ALL[rng.gen_range(0..Crop::ALL.len())];
            let district = PUNJAB_DISTRICTS[rng.gen_range(0..PUNJAB_DISTRICTS.len())];
            let soil_type = SOIL_TYPES[rng.gen_range(0..SOIL_TYPES.len())];
            let sample = SoilSample::new(
                rng.gen_range(50.0..250.0),
                rng.gen_range(20.0..150.0),
                rng.gen_range(30.0..200.0),
            )
            .with_soil_type(soil_type)
            .with_district(district);
            let weather = WeatherContext::new(rng.gen_range(500.0..1500.0), rng.gen_range(20.0..35.0));

            let suitability = suitability_score(&sample, crop);
            let noise = 0.1 * standard_normal(&mut rng);
            let expected = (1000.0 + 4000.0 * (suitability + noise)).clamp(500.0, 6000.0);
            TrainingRow::new(crop, sample, weather, Some(expected))
        })
        .collect()
}

/// Train/test index split keeping each class's share in both halves
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [0u8, 1] {
        let mut idx: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        idx.shuffle(&mut rng);
        let n_test = (idx.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Random train/test index split
pub fn shuffle_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut rng);
    let n_test = (n as f64 * test_fraction).round() as usize;
    let test = idx[..n_test].to_vec();
    let train = idx[n_test..].to_vec();
    (train, test)
}

/// Fold number for each row, stratified by class
pub fn stratified_folds(labels: &[u8], k: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut folds = vec![0; labels.len()];
    for class in [0u8, 1] {
        let mut idx: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        idx.shuffle(&mut rng);
        for (pos, i) in idx.into_iter().enumerate() {
            folds[i] = pos % k;
        }
    }
    folds
}

fn select<T: Clone>(values: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| values[i].clone()).collect()
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn classifier_config(config: &TrainingConfig) -> ForestConfig {
    ForestConfig::classifier()
        .with_trees(config.n_trees)
        .with_max_depth(config.max_depth)
        .with_seed(config.seed)
}

fn evaluate_classifier(model: &RandomForestClassifier, x: &[Vec<f64>], y: &[u8]) -> AppResult<f64> {
    let predicted = x
        .iter()
        .map(|row| model.predict(row))
        .collect::<AppResult<Vec<u8>>>()?;
    Ok(accuracy(&predicted, y))
}

/// Cross-validated accuracy (mean, std) over `k` stratified folds
pub fn cross_validate(
    x: &[Vec<f64>],
    y: &[u8],
    k: usize,
    config: &ForestConfig,
    seed: u64,
) -> AppResult<(f64, f64)> {
    if k < 2 {
        return Ok((0.0, 0.0));
    }
    let folds = stratified_folds(y, k, seed);
    let mut scores = Vec::with_capacity(k);
    for fold in 0..k {
        let (test, train): (Vec<usize>, Vec<usize>) = (0..y.len()).partition(|&i| folds[i] == fold);
        if test.is_empty() || train.is_empty() {
            continue;
        }
        let mut model = RandomForestClassifier::new(config.clone());
        model.fit(&select(x, &train), &select(y, &train))?;
        scores.push(evaluate_classifier(&model, &select(x, &test), &select(y, &test))?);
    }
    Ok(mean_std(&scores))
}

/// Fit the full bundle on `rows`
pub fn train_bundle(rows: &[TrainingRow], config: &TrainingConfig) -> AppResult<TrainedArtifacts> {
    if rows.len() < KMeansConfig::default().n_clusters {
        return Err(AppError::Training(format!(
            "need at least {} training rows, got {}",
            KMeansConfig::default().n_clusters,
            rows.len()
        )));
    }

    let samples: Vec<SoilSample> = rows.iter().map(|r| r.sample.clone()).collect();
    let features = FeatureEngineer::fit(&samples)?;
    let raw: Vec<Vec<f64>> = rows
        .iter()
        .map(|r| features.derive(&r.sample, &r.weather).to_vec())
        .collect();
    let scaler = StandardScaler::fit(&raw)?;
    let x = scaler.transform_all(&raw)?;
    let labels: Vec<u8> = rows.iter().map(|r| r.recommended).collect();
    let yields: Vec<f64> = rows.iter().map(|r| r.yield_kg_ha).collect();

    // Suitability classifier
    let forest = classifier_config(config);
    let (train, test) = stratified_split(&labels, TEST_FRACTION, config.seed);
    let mut classifier = RandomForestClassifier::new(forest.clone());
    classifier.fit(&select(&x, &train), &select(&labels, &train))?;
    let classifier_accuracy = evaluate_classifier(&classifier, &select(&x, &test), &select(&labels, &test))?;
    let (cv_mean, cv_std) = cross_validate(&x, &labels, config.cv_folds, &forest, config.seed)?;
    tracing::info!(
        accuracy = classifier_accuracy,
        cv_mean,
        cv_std,
        "Crop recommender trained"
    );

    let mut feature_importances: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(classifier.feature_importances())
        .map(|(name, &importance)| FeatureImportance {
            feature: name.to_string(),
            importance,
        })
        .collect();
    feature_importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    feature_importances.truncate(TOP_IMPORTANCES);

    // Yield regressor
    let (train, test) = shuffle_split(rows.len(), TEST_FRACTION, config.seed);
    let mut regressor = RandomForestRegressor::new(
        ForestConfig::regressor()
            .with_trees(config.n_trees)
            .with_seed(config.seed),
    );
    regressor.fit(&select(&x, &train), &select(&yields, &train))?;
    let predicted = select(&x, &test)
        .iter()
        .map(|row| regressor.predict(row))
        .collect::<AppResult<Vec<f64>>>()?;
    let actual = select(&yields, &test);
    let regressor_rmse = rmse(&predicted, &actual);
    let regressor_r2 = r2_score(&predicted, &actual);
    tracing::info!(rmse = regressor_rmse, r2 = regressor_r2, "Yield predictor trained");

    // Soil health clusters on scaled NPK
    let npk: Vec<Vec<f64>> = samples.iter().map(|s| s.npk().to_array().to_vec()).collect();
    let soil_scaler = StandardScaler::fit(&npk)?;
    let mut clusterer = KMeans::new(KMeansConfig {
        seed: config.seed,
        ..KMeansConfig::default()
    });
    clusterer.fit(&soil_scaler.transform_all(&npk)?)?;
    let soil_labels = rank_cluster_labels(clusterer.centroids());
    tracing::info!(labels = ?soil_labels, "Soil classifier trained");

    let report = TrainingReport {
        samples: rows.len(),
        classifier_accuracy,
        cv_accuracy_mean: cv_mean,
        cv_accuracy_std: cv_std,
        feature_importances,
        regressor_rmse,
        regressor_r2,
        soil_health_labels: soil_labels.clone(),
        estimated_yield_labels: rows
            .iter()
            .filter(|r| r.label_source == LabelSource::EstimatedFromSuitability)
            .count(),
    };

    Ok(TrainedArtifacts {
        features,
        scaler,
        classifier,
        regressor,
        soil_scaler,
        clusterer,
        soil_labels,
        metadata: BundleMetadata::new(report),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_yield_is_estimated_and_tagged() {
        let sample = SoilSample::new(135.0, 70.0, 50.0);
        let row = TrainingRow::new(Crop::Wheat, sample.clone(), WeatherContext::default(), None);
        assert_eq!(row.label_source, LabelSource::EstimatedFromSuitability);
        assert_eq!(row.yield_kg_ha, 4500.0);
        assert_eq!(row.recommended, 1);

        let row = TrainingRow::new(Crop::Wheat, sample, WeatherContext::default(), Some(3900.0));
        assert_eq!(row.label_source, LabelSource::Measured);
        assert_eq!(row.yield_kg_ha, 3900.0);
    }

    #[test]
    fn synthetic_data_is_reproducible_and_in_range() {
        let a = synthetic_dataset(200, 7);
        let b = synthetic_dataset(200, 7);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.sample, y.sample);
            assert_eq!(x.yield_kg_ha, y.yield_kg_ha);
        }
        for row in &a {
            assert!((50.0..250.0).contains(&row.sample.nitrogen));
            assert!((20.0..150.0).contains(&row.sample.phosphorus));
            assert!((30.0..200.0).contains(&row.sample.potassium));
            assert!((500.0..=6000.0).contains(&row.yield_kg_ha));
            assert!(SOIL_TYPES.contains(&row.sample.soil_type.as_str()));
            assert_eq!(row.label_source, LabelSource::Measured);
        }
    }

    #[test]
    fn stratified_split_keeps_class_shares() {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i < 30)).collect();
        let (train, test) = stratified_split(&labels, 0.2, 1);
        assert_eq!(train.len() + test.len(), 100);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 6);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 0).count(), 14);
    }

    #[test]
    fn folds_cover_every_row() {
        let labels: Vec<u8> = (0..50).map(|i| u8::from(i % 3 == 0)).collect();
        let folds = stratified_folds(&labels, 5, 3);
        for fold in 0..5 {
            let size = folds.iter().filter(|&&f| f == fold).count();
            assert!((9..=11).contains(&size));
        }
    }
}
