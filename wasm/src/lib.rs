//! WebAssembly module for Crop Advisor
//!
//! Provides client-side computation for:
//! - Crop suitability scores and formula rankings
//! - Fertilizer quantities for nutrient deficits
//! - Soil health estimates without the trained clusterer
//! - Offline input validation

use serde::Serialize;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

/// Suitability of soil levels for a crop, in `[0, 1]`
#[wasm_bindgen]
pub fn crop_suitability(crop: &str, nitrogen: f64, phosphorus: f64, potassium: f64) -> f64 {
    let sample = SoilSample::new(nitrogen, phosphorus, potassium);
    suitability_score(&sample, Crop::resolve(crop))
}

#[derive(Serialize)]
struct CropScore {
    crop: Crop,
    suitability_score: f64,
}

fn ranked_scores(sample: &SoilSample) -> Vec<CropScore> {
    let mut scores: Vec<CropScore> = Crop::ALL
        .iter()
        .map(|&crop| CropScore {
            crop,
            suitability_score: suitability_score(sample, crop),
        })
        .collect();
    scores.sort_by(|a, b| b.suitability_score.total_cmp(&a.suitability_score));
    scores
}

/// All crops ranked by suitability, as JSON
#[wasm_bindgen]
pub fn rank_crops(nitrogen: f64, phosphorus: f64, potassium: f64) -> Result<String, JsValue> {
    to_json(&ranked_scores(&SoilSample::new(nitrogen, phosphorus, potassium)))
}

/// Fertilizer advice for a crop, as JSON
#[wasm_bindgen]
pub fn fertilizer_advice(
    crop: &str,
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
) -> Result<String, JsValue> {
    let sample = SoilSample::new(nitrogen, phosphorus, potassium);
    to_json(&fertilizer_for(&sample, Crop::resolve(crop)))
}

/// Soil health category from total nutrients
#[wasm_bindgen]
pub fn soil_health_status(nitrogen: f64, phosphorus: f64, potassium: f64) -> String {
    heuristic_health_status(nitrogen + phosphorus + potassium).to_string()
}

/// Full heuristic soil health report, as JSON
#[wasm_bindgen]
pub fn soil_health_report(nitrogen: f64, phosphorus: f64, potassium: f64) -> Result<String, JsValue> {
    to_json(&SoilHealthReport::heuristic(nitrogen + phosphorus + potassium))
}

/// Total production (kg) for a yield per hectare and an area
#[wasm_bindgen]
pub fn total_production(yield_per_hectare: f64, area: f64) -> f64 {
    if validate_area(area).is_err() {
        return 0.0;
    }
    yield_per_hectare * area
}

/// Check soil levels before queueing an offline request
#[wasm_bindgen]
pub fn validate_soil_levels(nitrogen: f64, phosphorus: f64, potassium: f64) -> bool {
    validate_soil_sample(&SoilSample::new(nitrogen, phosphorus, potassium)).is_ok()
}
