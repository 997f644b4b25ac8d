//! Recommendation orchestration over the trained bundle or the formula-only fallback

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;
use shared::{
    fallback_base_yield, fertilizer_for, rank_recommendations, suitability_score, Crop,
    FertilizerAdvice, FullReport, ModelVersion, Recommendation, SoilHealthReport, SoilSample,
    WeatherContext, YieldPrediction,
};

use crate::artifacts::{BundleMetadata, ModelBundle};
use crate::error::{AppError, AppResult};

/// Jitter applied to the formula score to stand in for classifier confidence
const FALLBACK_CONFIDENCE_JITTER: f64 = 0.05;
const FALLBACK_YIELD_RANGE: (f64, f64) = (0.8, 1.2);
const FALLBACK_YIELD_CONFIDENCE: f64 = 0.75;
const FALLBACK_YIELD_SUITABILITY: f64 = 0.8;

/// A result tagged with the model mode that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Versioned<T> {
    pub value: T,
    pub model_version: ModelVersion,
}

impl<T> Versioned<T> {
    fn new(value: T, bundle: &Option<Arc<ModelBundle>>) -> Self {
        let model_version = if bundle.is_some() {
            ModelVersion::Trained
        } else {
            ModelVersion::Fallback
        };
        Self {
            value,
            model_version,
        }
    }
}

/// Yield estimate with the ranking it was taken from (empty in fallback mode)
#[derive(Debug, Clone, Serialize)]
pub struct YieldForecast {
    pub prediction: YieldPrediction,
    pub recommendations: Vec<Recommendation>,
}

/// Recommendation engine owning the current model bundle
///
/// Each call takes a snapshot of the bundle under a short read lock and
/// then works on immutable data. Without a bundle every operation falls back
/// to formulas and bounded randomness.
#[derive(Default)]
pub struct RecommendationEngine {
    bundle: RwLock<Option<Arc<ModelBundle>>>,
}

impl RecommendationEngine {
    pub fn new(bundle: Option<ModelBundle>) -> Self {
        Self {
            bundle: RwLock::new(bundle.map(Arc::new)),
        }
    }

    /// Engine without trained models
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Load the bundle at `dir`; any problem leaves the engine in fallback mode
    pub fn load(dir: &Path) -> Self {
        match ModelBundle::load(dir) {
            Ok(Some(bundle)) => {
                tracing::info!(
                    dir = %dir.display(),
                    bundle_id = %bundle.metadata.bundle_id,
                    "Trained models loaded"
                );
                Self::new(Some(bundle))
            }
            Ok(None) => {
                tracing::warn!(dir = %dir.display(), "Model files not found, using fallback predictions");
                Self::fallback()
            }
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "Failed to load models, using fallback predictions");
                Self::fallback()
            }
        }
    }

    /// Replace the current bundle with the one at `dir`.
    ///
    /// Returns `Ok(false)` if `dir` holds no complete bundle. The current
    /// bundle is kept whenever the reload does not succeed.
    pub fn reload(&self, dir: &Path) -> AppResult<bool> {
        match ModelBundle::load(dir)? {
            Some(bundle) => {
                self.swap(bundle);
                Ok(true)
            }
            None => {
                tracing::warn!(dir = %dir.display(), "Reload skipped, bundle incomplete");
                Ok(false)
            }
        }
    }

    /// Atomically install a new bundle
    pub fn swap(&self, bundle: ModelBundle) {
        let bundle_id = bundle.metadata.bundle_id;
        *self.bundle.write() = Some(Arc::new(bundle));
        tracing::info!(%bundle_id, "Model bundle swapped");
    }

    fn snapshot(&self) -> Option<Arc<ModelBundle>> {
        self.bundle.read().clone()
    }

    pub fn is_trained(&self) -> bool {
        self.bundle.read().is_some()
    }

    pub fn model_version(&self) -> ModelVersion {
        if self.is_trained() {
            ModelVersion::Trained
        } else {
            ModelVersion::Fallback
        }
    }

    pub fn metadata(&self) -> Option<BundleMetadata> {
        self.snapshot().map(|b| b.metadata.clone())
    }

    /// Score every known crop for the sample and rank them
    pub fn recommend(
        &self,
        sample: &SoilSample,
        weather: &WeatherContext,
        location: &str,
    ) -> AppResult<Versioned<Vec<Recommendation>>> {
        let bundle = self.snapshot();
        let recommendations = recommend_with(bundle.as_deref(), sample, weather, location)?;
        Ok(Versioned::new(recommendations, &bundle))
    }

    /// Recommendations plus fertilizer advice for the best crop and soil health
    pub fn full_report(
        &self,
        sample: &SoilSample,
        weather: &WeatherContext,
        location: &str,
    ) -> AppResult<Versioned<FullReport>> {
        let bundle = self.snapshot();
        let recommendations = recommend_with(bundle.as_deref(), sample, weather, location)?;
        let target = recommendations.first().map_or(Crop::Wheat, |r| r.crop);
        let report = FullReport {
            fertilizer_recommendations: fertilizer_for(sample, target),
            soil_health: analyze_with(bundle.as_deref(), sample)?,
            recommendations,
        };
        Ok(Versioned::new(report, &bundle))
    }

    pub fn analyze_soil(&self, sample: &SoilSample) -> AppResult<Versioned<SoilHealthReport>> {
        let bundle = self.snapshot();
        let report = analyze_with(bundle.as_deref(), sample)?;
        Ok(Versioned::new(report, &bundle))
    }

    /// Fertilizer advice for a free-text crop name; unknown names use wheat
    pub fn fertilizer_for(&self, sample: &SoilSample, crop: &str) -> Versioned<Vec<FertilizerAdvice>> {
        let bundle = self.snapshot();
        Versioned::new(fertilizer_for(sample, Crop::resolve(crop)), &bundle)
    }

    /// Yield estimate for `crop` over `area` hectares
    pub fn predict_yield(
        &self,
        sample: &SoilSample,
        weather: &WeatherContext,
        location: &str,
        crop: &str,
        area: f64,
    ) -> AppResult<Versioned<YieldForecast>> {
        let bundle = self.snapshot();
        let forecast = match bundle.as_deref() {
            Some(b) => {
                let recommendations = recommend_with(Some(b), sample, weather, location)?;
                let wanted = Crop::from_name(crop);
                let chosen = recommendations
                    .iter()
                    .find(|r| Some(r.crop) == wanted)
                    .or_else(|| recommendations.first())
                    .ok_or_else(|| AppError::ModelInference("no crop recommendations".into()))?;
                let prediction = YieldPrediction::new(
                    chosen.crop.name(),
                    chosen.predicted_yield,
                    area,
                    chosen.recommendation_confidence,
                    chosen.suitability_score,
                );
                YieldForecast {
                    prediction,
                    recommendations,
                }
            }
            None => {
                let (lo, hi) = FALLBACK_YIELD_RANGE;
                let yield_per_hectare = fallback_base_yield(crop) * rand::thread_rng().gen_range(lo..=hi);
                YieldForecast {
                    prediction: YieldPrediction::new(
                        crop,
                        yield_per_hectare,
                        area,
                        FALLBACK_YIELD_CONFIDENCE,
                        FALLBACK_YIELD_SUITABILITY,
                    ),
                    recommendations: Vec::new(),
                }
            }
        };
        Ok(Versioned::new(forecast, &bundle))
    }
}

fn recommend_with(
    bundle: Option<&ModelBundle>,
    sample: &SoilSample,
    weather: &WeatherContext,
    location: &str,
) -> AppResult<Vec<Recommendation>> {
    let mut recommendations = match bundle {
        Some(b) => trained_recommendations(b, sample, weather, location)?,
        None => fallback_recommendations(sample),
    };
    rank_recommendations(&mut recommendations);
    Ok(recommendations)
}

fn trained_recommendations(
    bundle: &ModelBundle,
    sample: &SoilSample,
    weather: &WeatherContext,
    location: &str,
) -> AppResult<Vec<Recommendation>> {
    let located = sample.clone().with_district(location);
    let raw = bundle.features.derive(&located, weather);
    let x = bundle.scaler.transform(&raw.to_array())?;

    // The crop is not a model input, so both predictions are shared by all crops
    let confidence = bundle.classifier.predict_proba(&x)?;
    let predicted_yield = bundle.regressor.predict(&x)?;
    if !confidence.is_finite() || !predicted_yield.is_finite() {
        return Err(AppError::ModelInference("model returned a non-finite value".into()));
    }

    Ok(Crop::ALL
        .iter()
        .map(|&crop| {
            Recommendation::new(
                crop,
                suitability_score(sample, crop),
                confidence,
                predicted_yield,
            )
        })
        .collect())
}

fn fallback_recommendations(sample: &SoilSample) -> Vec<Recommendation> {
    let mut rng = rand::thread_rng();
    let (lo, hi) = FALLBACK_YIELD_RANGE;
    Crop::ALL
        .iter()
        .map(|&crop| {
            let suitability = suitability_score(sample, crop);
            let jitter = rng.gen_range(-FALLBACK_CONFIDENCE_JITTER..=FALLBACK_CONFIDENCE_JITTER);
            let confidence = (suitability + jitter).clamp(0.0, 1.0);
            let predicted_yield = crop.base_yield() * rng.gen_range(lo..=hi);
            Recommendation::new(crop, suitability, confidence, predicted_yield)
        })
        .collect()
}

fn analyze_with(bundle: Option<&ModelBundle>, sample: &SoilSample) -> AppResult<SoilHealthReport> {
    match bundle {
        Some(b) => b.soil.analyze(sample),
        None => Ok(SoilHealthReport::heuristic(sample.npk().total())),
    }
}
