//! Fertilizer deficit calculator

use serde::{Deserialize, Serialize};

use crate::models::crop::Crop;
use crate::models::soil::SoilSample;
use crate::types::{NpkLevels, Nutrient};

pub const FERTILIZER_UNIT: &str = "kg/ha";

/// Commercial fertilizer products used to close nutrient gaps
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Fertilizer {
    #[serde(rename = "Urea")]
    Urea,
    #[serde(rename = "Single Super Phosphate")]
    SingleSuperPhosphate,
    #[serde(rename = "Muriate of Potash")]
    MuriateOfPotash,
}

impl Fertilizer {
    /// Product that supplies the nutrient
    pub fn for_nutrient(nutrient: Nutrient) -> Fertilizer {
        match nutrient {
            Nutrient::Nitrogen => Fertilizer::Urea,
            Nutrient::Phosphorus => Fertilizer::SingleSuperPhosphate,
            Nutrient::Potassium => Fertilizer::MuriateOfPotash,
        }
    }

    /// Fraction of the product mass that is the active nutrient
    pub fn nutrient_fraction(&self) -> f64 {
        match self {
            // 46% N
            Fertilizer::Urea => 0.46,
            // 16% P2O5
            Fertilizer::SingleSuperPhosphate => 0.16,
            // 60% K2O
            Fertilizer::MuriateOfPotash => 0.60,
        }
    }
}

impl std::fmt::Display for Fertilizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fertilizer::Urea => write!(f, "Urea"),
            Fertilizer::SingleSuperPhosphate => write!(f, "Single Super Phosphate"),
            Fertilizer::MuriateOfPotash => write!(f, "Muriate of Potash"),
        }
    }
}

/// Dosing advice for one deficient nutrient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FertilizerAdvice {
    pub nutrient: Nutrient,
    /// Shortfall against the crop optimum (kg/ha)
    pub deficit: f64,
    pub fertilizer: Fertilizer,
    /// Product quantity to apply
    pub quantity: f64,
    pub unit: String,
}

/// Shortfall of a nutrient against a target, never negative
pub fn nutrient_deficit(level: f64, requirement: f64) -> f64 {
    (requirement - level).max(0.0)
}

/// Fertilizer needed to bring soil levels up to a crop's requirement.
///
/// Nutrients without a deficit are omitted; an empty list means no additional
/// fertilizer is needed.
pub fn fertilizer_for_levels(levels: &NpkLevels, crop: Crop) -> Vec<FertilizerAdvice> {
    let requirement = crop.requirement();

    Nutrient::ALL
        .iter()
        .filter_map(|&nutrient| {
            let deficit = nutrient_deficit(levels.get(nutrient), requirement.get(nutrient));
            if deficit <= 0.0 {
                return None;
            }
            let fertilizer = Fertilizer::for_nutrient(nutrient);
            Some(FertilizerAdvice {
                nutrient,
                deficit,
                fertilizer,
                quantity: deficit / fertilizer.nutrient_fraction(),
                unit: FERTILIZER_UNIT.to_string(),
            })
        })
        .collect()
}

/// Fertilizer advice for a soil sample and target crop
pub fn fertilizer_for(sample: &SoilSample, crop: Crop) -> Vec<FertilizerAdvice> {
    fertilizer_for_levels(&sample.npk(), crop)
}
