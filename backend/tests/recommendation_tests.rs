//! Recommendation engine tests
//!
//! Covers trained and degraded modes:
//! - Both gates must pass for a crop to be recommended
//! - Rankings are sorted by suitability, stable for ties
//! - Degraded mode never fails and is tagged as the mock version
//! - Feature derivation and soil labelling are deterministic

mod common;

use common::fake_bundle;
use crop_advisor_backend::features::FeatureEngineer;
use crop_advisor_backend::services::rank_cluster_labels;
use crop_advisor_backend::RecommendationEngine;
use proptest::prelude::*;
use shared::{Crop, HealthStatus, ModelVersion, SoilSample, WeatherContext};

// ============================================================================
// Property Test Strategies
// ============================================================================

fn sample_strategy() -> impl Strategy<Value = SoilSample> {
    (0.0f64..400.0, 0.0f64..400.0, 0.0f64..400.0, "[a-z]{3,8}", "[A-Z][a-z]{3,10}").prop_map(
        |(n, p, k, soil, district)| {
            SoilSample::new(n, p, k)
                .with_soil_type(soil)
                .with_district(district)
        },
    )
}

fn weather_strategy() -> impl Strategy<Value = WeatherContext> {
    (0.0f64..3000.0, -10.0f64..50.0).prop_map(|(r, t)| WeatherContext::new(r, t))
}

// ============================================================================
// Trained Mode
// ============================================================================

#[test]
fn recommended_requires_both_gates() {
    let sample = SoilSample::new(200.0, 100.0, 60.0);
    let weather = WeatherContext::default();

    let confident = RecommendationEngine::new(Some(fake_bundle(0.9, 4200.0)));
    let recs = confident.recommend(&sample, &weather, "Ludhiana").unwrap();
    assert_eq!(recs.model_version, ModelVersion::Trained);
    for rec in &recs.value {
        assert_eq!(rec.recommended, rec.suitability_score >= 0.7);
        assert_eq!(rec.recommendation_confidence, 0.9);
        assert_eq!(rec.predicted_yield, 4200.0);
    }

    let doubtful = RecommendationEngine::new(Some(fake_bundle(0.3, 4200.0)));
    let recs = doubtful.recommend(&sample, &weather, "Ludhiana").unwrap();
    assert!(recs.value.iter().all(|r| !r.recommended));
}

#[test]
fn high_confidence_does_not_rescue_unsuitable_crops() {
    // Only bajra's requirement is met by this sample
    let sample = SoilSample::new(60.0, 30.0, 30.0);
    let engine = RecommendationEngine::new(Some(fake_bundle(0.99, 3000.0)));
    let recs = engine
        .recommend(&sample, &WeatherContext::default(), "Bathinda")
        .unwrap();

    assert_eq!(recs.value.len(), Crop::ALL.len());
    for rec in &recs.value {
        assert_eq!(rec.recommendation_confidence, 0.99);
        match rec.crop {
            Crop::Bajra => {
                assert!(rec.suitability_score >= 0.7);
                assert!(rec.recommended);
            }
            _ => {
                assert!(rec.suitability_score < 0.7, "{:?}", rec.crop);
                assert!(!rec.recommended, "{:?} should be gated out", rec.crop);
            }
        }
    }
    assert_eq!(recs.value[0].crop, Crop::Bajra);
}

#[test]
fn negative_yield_is_clamped() {
    let engine = RecommendationEngine::new(Some(fake_bundle(0.9, -50.0)));
    let recs = engine
        .recommend(&SoilSample::default(), &WeatherContext::default(), "Moga")
        .unwrap();
    assert!(recs.value.iter().all(|r| r.predicted_yield == 0.0));
}

#[test]
fn ties_keep_crop_table_order() {
    // Every crop fully satisfied, so all scores tie at 1.0
    let sample = SoilSample::new(500.0, 500.0, 500.0);
    let engine = RecommendationEngine::new(Some(fake_bundle(0.8, 3000.0)));
    let recs = engine
        .recommend(&sample, &WeatherContext::default(), "Patiala")
        .unwrap()
        .value;
    let order: Vec<Crop> = recs.iter().map(|r| r.crop).collect();
    assert_eq!(order, Crop::ALL.to_vec());
}

#[test]
fn full_report_targets_the_top_crop() {
    // Bajra is the only crop whose requirement is met
    let sample = SoilSample::new(60.0, 30.0, 30.0);
    let engine = RecommendationEngine::new(Some(fake_bundle(0.8, 3000.0)));
    let report = engine
        .full_report(&sample, &WeatherContext::default(), "Mansa")
        .unwrap()
        .value;
    assert_eq!(report.recommendations[0].crop, Crop::Bajra);
    assert!(report.fertilizer_recommendations.is_empty());
    assert_eq!(report.soil_health.cluster, Some(0));
    assert_eq!(report.soil_health.health_status, HealthStatus::Poor);
}

#[test]
fn trained_yield_prediction_picks_named_crop() {
    let engine = RecommendationEngine::new(Some(fake_bundle(0.8, 3000.0)));
    let forecast = engine
        .predict_yield(
            &SoilSample::new(135.0, 70.0, 50.0),
            &WeatherContext::default(),
            "Amritsar",
            "Potato",
            2.5,
        )
        .unwrap();
    assert_eq!(forecast.model_version, ModelVersion::Trained);
    assert_eq!(forecast.value.prediction.crop, "potato");
    assert_eq!(forecast.value.prediction.total_production, 7500.0);
    assert_eq!(forecast.value.recommendations.len(), Crop::ALL.len());

    // Unknown crops fall back to the top-ranked entry
    let forecast = engine
        .predict_yield(
            &SoilSample::new(135.0, 70.0, 50.0),
            &WeatherContext::default(),
            "Amritsar",
            "cotton",
            1.0,
        )
        .unwrap();
    assert_eq!(forecast.value.prediction.crop, "rice");
}

#[test]
fn swap_replaces_the_whole_bundle() {
    let engine = RecommendationEngine::fallback();
    assert_eq!(engine.model_version(), ModelVersion::Fallback);
    engine.swap(fake_bundle(0.6, 1000.0));
    assert!(engine.is_trained());
    assert_eq!(engine.model_version(), ModelVersion::Trained);
}

// ============================================================================
// Degraded Mode
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn fallback_never_fails(sample in sample_strategy(), weather in weather_strategy()) {
        let engine = RecommendationEngine::fallback();
        let report = engine.full_report(&sample, &weather, &sample.district.clone());
        prop_assert!(report.is_ok());
        let report = report.unwrap();
        prop_assert_eq!(report.model_version, ModelVersion::Fallback);
        prop_assert!(report.value.soil_health.cluster.is_none());

        let recs = &report.value.recommendations;
        prop_assert!(recs.windows(2).all(|w| w[0].suitability_score >= w[1].suitability_score));
        for rec in recs {
            prop_assert!((0.0..=1.0).contains(&rec.recommendation_confidence));
            prop_assert!(rec.predicted_yield >= 0.0);
            prop_assert_eq!(
                rec.recommended,
                rec.suitability_score >= 0.7 && rec.recommendation_confidence >= 0.5
            );
        }
    }

    #[test]
    fn trained_ranking_is_sorted(sample in sample_strategy(), weather in weather_strategy()) {
        let engine = RecommendationEngine::new(Some(fake_bundle(0.7, 2500.0)));
        let recs = engine.recommend(&sample, &weather, "Sangrur").unwrap().value;
        prop_assert!(recs.windows(2).all(|w| w[0].suitability_score >= w[1].suitability_score));
    }

    #[test]
    fn feature_derivation_is_pure(sample in sample_strategy(), weather in weather_strategy()) {
        let engineer = FeatureEngineer::fit(&[sample.clone()]).unwrap();
        prop_assert_eq!(engineer.derive(&sample, &weather), engineer.derive(&sample, &weather));
    }

    #[test]
    fn soil_labels_follow_centroid_means(
        means in prop::collection::vec(-3.0f64..3.0, 5),
        rotation in 0usize..5,
    ) {
        let mut centroids: Vec<Vec<f64>> = means.iter().map(|&m| vec![m, m, m]).collect();
        centroids.rotate_left(rotation);
        let labels = rank_cluster_labels(&centroids);
        for a in 0..centroids.len() {
            for b in 0..centroids.len() {
                if centroids[a][0] < centroids[b][0] {
                    prop_assert!(labels[a] < labels[b]);
                }
            }
        }
    }
}

#[test]
fn fallback_soil_health_uses_total_nutrients() {
    let engine = RecommendationEngine::fallback();
    let cases = [
        (SoilSample::new(200.0, 150.0, 100.0), HealthStatus::Good),
        (SoilSample::new(150.0, 40.0, 100.0), HealthStatus::Average),
        (SoilSample::new(100.0, 50.0, 100.0), HealthStatus::Poor),
    ];
    for (sample, expected) in cases {
        let report = engine.analyze_soil(&sample).unwrap();
        assert_eq!(report.value.health_status, expected);
        assert_eq!(report.value.recommendations.len(), 3);
    }
}

#[test]
fn fertilizer_advice_is_exact_in_both_modes() {
    let sample = SoilSample::new(100.0, 70.0, 50.0);
    let fallback = RecommendationEngine::fallback().fertilizer_for(&sample, "wheat");
    let trained = RecommendationEngine::new(Some(fake_bundle(0.5, 0.0))).fertilizer_for(&sample, "wheat");
    assert_eq!(fallback.value, trained.value);
    assert_eq!(fallback.model_version, ModelVersion::Fallback);
    assert_eq!(trained.model_version, ModelVersion::Trained);
}
