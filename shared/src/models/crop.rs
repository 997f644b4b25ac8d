//! Crop catalogue, nutrient requirements and the suitability formula

use serde::{Deserialize, Serialize};

use crate::models::soil::SoilSample;
use crate::types::{NpkLevels, Nutrient};

/// Suitability at or above which a crop counts as a match for the soil
pub const SUITABILITY_THRESHOLD: f64 = 0.7;

/// Crops covered by the recommendation engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Rice,
    Wheat,
    Potato,
    Bajra,
}

impl Crop {
    /// Every crop, in the order recommendations are evaluated
    pub const ALL: [Crop; 4] = [Crop::Rice, Crop::Wheat, Crop::Potato, Crop::Bajra];

    pub fn name(&self) -> &'static str {
        match self {
            Crop::Rice => "rice",
            Crop::Wheat => "wheat",
            Crop::Potato => "potato",
            Crop::Bajra => "bajra",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Crop> {
        let name = name.trim();
        Crop::ALL
            .into_iter()
            .find(|crop| crop.name().eq_ignore_ascii_case(name))
    }

    /// Lookup that falls back to wheat for crops outside the catalogue
    pub fn resolve(name: &str) -> Crop {
        Crop::from_name(name).unwrap_or(Crop::Wheat)
    }

    /// Optimum NPK levels for the crop (kg/ha)
    pub fn requirement(&self) -> CropRequirement {
        match self {
            Crop::Rice => CropRequirement::new(135.0, 70.0, 50.0),
            Crop::Wheat => CropRequirement::new(135.0, 70.0, 50.0),
            Crop::Potato => CropRequirement::new(175.0, 100.0, 175.0),
            Crop::Bajra => CropRequirement::new(60.0, 30.0, 30.0),
        }
    }

    /// Typical yield (kg/ha) used to estimate training labels when no
    /// measurement exists
    pub fn base_yield(&self) -> f64 {
        match self {
            Crop::Rice => 4000.0,
            Crop::Wheat => 4500.0,
            Crop::Potato => 25000.0,
            Crop::Bajra => 2000.0,
        }
    }
}

impl std::fmt::Display for Crop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Base yield for estimates on crops without a measurement
pub const UNKNOWN_CROP_BASE_YIELD: f64 = 3000.0;

/// Base yield (kg/ha) for the formula-only yield estimate.
///
/// Covers a wider set of crops than [`Crop`] because the estimate accepts
/// free-text crop names.
pub fn fallback_base_yield(crop_name: &str) -> f64 {
    match crop_name.trim().to_lowercase().as_str() {
        "wheat" => 4500.0,
        "rice" => 6000.0,
        "potato" => 25000.0,
        "bajra" => 2500.0,
        "maize" => 5500.0,
        "sugarcane" => 70000.0,
        "cotton" => 500.0,
        _ => 4000.0,
    }
}

/// Agronomic NPK optimum for a crop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CropRequirement {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl CropRequirement {
    pub fn new(nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            nitrogen,
            phosphorus,
            potassium,
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
        }
    }
}

/// Score in `[0, 1]` for how well soil levels cover a requirement.
///
/// Each nutrient contributes `min(1, level / optimum)`; the score is the mean
/// of the three.
pub fn suitability_for_requirement(levels: &NpkLevels, requirement: &CropRequirement) -> f64 {
    let total: f64 = Nutrient::ALL
        .iter()
        .map(|&nutrient| nutrient_score(levels.get(nutrient), requirement.get(nutrient)))
        .sum();
    total / Nutrient::ALL.len() as f64
}

fn nutrient_score(level: f64, optimum: f64) -> f64 {
    if optimum <= 0.0 {
        return 1.0;
    }
    (level / optimum).clamp(0.0, 1.0)
}

/// Suitability of a soil sample for a crop
pub fn suitability_score(sample: &SoilSample, crop: Crop) -> f64 {
    suitability_for_requirement(&sample.npk(), &crop.requirement())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rice_fully_satisfied() {
        let sample = SoilSample::new(270.0, 70.0, 50.0);
        assert_relative_eq!(suitability_score(&sample, Crop::Rice), 1.0);
    }

    #[test]
    fn partial_scores_are_averaged() {
        // Bajra optimum (60, 30, 30): N ratio 0.5, P ratio 1.0, K ratio 0.0
        let sample = SoilSample::new(30.0, 45.0, 0.0);
        assert_relative_eq!(suitability_score(&sample, Crop::Bajra), 0.5);
    }

    #[test]
    fn crop_lookup_is_case_insensitive() {
        assert_eq!(Crop::from_name("  Potato "), Some(Crop::Potato));
        assert_eq!(Crop::from_name("maize"), None);
        assert_eq!(Crop::resolve("maize"), Crop::Wheat);
    }

    #[test]
    fn fallback_yields_cover_free_text_crops() {
        assert_eq!(fallback_base_yield("Sugarcane"), 70000.0);
        assert_eq!(fallback_base_yield("quinoa"), 4000.0);
    }

    #[test]
    fn crop_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Crop::Bajra).unwrap(), "\"bajra\"");
    }
}
