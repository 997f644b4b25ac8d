//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Tag carried by every response so callers can tell which mode produced it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelVersion {
    /// Output of the trained model bundle
    #[serde(rename = "v2.0.0-punjab-trained")]
    Trained,
    /// Formula-only output produced without trained artifacts
    #[serde(rename = "v2.0.0-mock")]
    Fallback,
}

impl ModelVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVersion::Trained => "v2.0.0-punjab-trained",
            ModelVersion::Fallback => "v2.0.0-mock",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ModelVersion::Fallback)
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary soil macronutrients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 3] = [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium];
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nutrient::Nitrogen => write!(f, "Nitrogen"),
            Nutrient::Phosphorus => write!(f, "Phosphorus"),
            Nutrient::Potassium => write!(f, "Potassium"),
        }
    }
}

/// Nitrogen, phosphorus and potassium levels in kg/ha
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NpkLevels {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl NpkLevels {
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

    pub fn total(&self) -> f64 {
        self.nitrogen + self.phosphorus + self.potassium
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.nitrogen, self.phosphorus, self.potassium]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_version_serializes_to_tag() {
        let json = serde_json::to_string(&ModelVersion::Fallback).unwrap();
        assert_eq!(json, "\"v2.0.0-mock\"");
        let json = serde_json::to_string(&ModelVersion::Trained).unwrap();
        assert_eq!(json, "\"v2.0.0-punjab-trained\"");
    }

    #[test]
    fn npk_total() {
        let npk = NpkLevels::new(150.0, 40.0, 100.0);
        assert_eq!(npk.total(), 290.0);
        assert_eq!(npk.get(Nutrient::Phosphorus), 40.0);
    }
}
