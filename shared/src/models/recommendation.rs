//! Recommendation results

use serde::{Deserialize, Serialize};

use crate::models::crop::{Crop, SUITABILITY_THRESHOLD};
use crate::models::fertilizer::FertilizerAdvice;
use crate::models::soil_health::SoilHealthReport;

/// Minimum classifier confidence for a recommendation
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Ranked recommendation for a single crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub crop: Crop,
    /// Formula score in `[0, 1]`
    pub suitability_score: f64,
    /// Classifier probability in `[0, 1]`
    pub recommendation_confidence: f64,
    /// Expected yield in kg/ha, never negative
    pub predicted_yield: f64,
    pub recommended: bool,
}

impl Recommendation {
    pub fn new(crop: Crop, suitability_score: f64, confidence: f64, predicted_yield: f64) -> Self {
        Self {
            crop,
            suitability_score,
            recommendation_confidence: confidence,
            predicted_yield: predicted_yield.max(0.0),
            recommended: is_recommended(suitability_score, confidence),
        }
    }
}

/// Both the formula and the classifier must agree
pub fn is_recommended(suitability_score: f64, confidence: f64) -> bool {
    suitability_score >= SUITABILITY_THRESHOLD && confidence >= CONFIDENCE_THRESHOLD
}

/// Sort by suitability, best first, keeping evaluation order for ties
pub fn rank_recommendations(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| b.suitability_score.total_cmp(&a.suitability_score));
}

/// Recommendations bundled with fertilizer and soil health sub-reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FullReport {
    pub recommendations: Vec<Recommendation>,
    pub fertilizer_recommendations: Vec<FertilizerAdvice>,
    pub soil_health: SoilHealthReport,
}

/// Yield estimate for a named crop over a planted area
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YieldPrediction {
    pub crop: String,
    /// kg/ha
    pub yield_per_hectare: f64,
    /// kg over the whole area
    pub total_production: f64,
    /// hectares
    pub area: f64,
    pub confidence: f64,
    pub suitability_score: f64,
}

impl YieldPrediction {
    pub fn new(
        crop: impl Into<String>,
        yield_per_hectare: f64,
        area: f64,
        confidence: f64,
        suitability_score: f64,
    ) -> Self {
        Self {
            crop: crop.into(),
            yield_per_hectare,
            total_production: yield_per_hectare * area,
            area,
            confidence,
            suitability_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_gates_required() {
        assert!(is_recommended(0.7, 0.5));
        assert!(!is_recommended(0.69, 0.9));
        assert!(!is_recommended(0.95, 0.49));
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let mut recs = vec![
            Recommendation::new(Crop::Rice, 0.8, 0.9, 4000.0),
            Recommendation::new(Crop::Wheat, 0.9, 0.9, 4500.0),
            Recommendation::new(Crop::Potato, 0.8, 0.1, 20000.0),
            Recommendation::new(Crop::Bajra, 1.0, 0.9, 2000.0),
        ];
        rank_recommendations(&mut recs);
        let order: Vec<_> = recs.iter().map(|r| r.crop).collect();
        assert_eq!(order, vec![Crop::Bajra, Crop::Wheat, Crop::Rice, Crop::Potato]);
    }

    #[test]
    fn negative_yield_is_clamped() {
        let rec = Recommendation::new(Crop::Rice, 0.5, 0.5, -10.0);
        assert_eq!(rec.predicted_yield, 0.0);
    }

    #[test]
    fn total_production_scales_with_area() {
        let prediction = YieldPrediction::new("wheat", 4500.0, 2.5, 0.8, 0.9);
        assert_eq!(prediction.total_production, 11250.0);
    }
}
