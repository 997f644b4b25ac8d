//! Soil and weather inputs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::NpkLevels;

pub const DEFAULT_NITROGEN: f64 = 150.0;
pub const DEFAULT_PHOSPHORUS: f64 = 40.0;
pub const DEFAULT_POTASSIUM: f64 = 100.0;
pub const DEFAULT_RAINFALL_MM: f64 = 700.0;
pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;
pub const DEFAULT_SOIL_TYPE: &str = "loamy";
pub const DEFAULT_LOCATION: &str = "Unknown";

/// A soil test result for one field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SoilSample {
    /// Nitrogen in kg/ha
    #[validate(range(min = 0.0, message = "Nutrient level cannot be negative"))]
    pub nitrogen: f64,
    /// Phosphorus in kg/ha
    #[validate(range(min = 0.0, message = "Nutrient level cannot be negative"))]
    pub phosphorus: f64,
    /// Potassium in kg/ha
    #[validate(range(min = 0.0, message = "Nutrient level cannot be negative"))]
    pub potassium: f64,
    pub soil_type: String,
    pub district: String,
}

impl SoilSample {
    pub fn new(nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            nitrogen,
            phosphorus,
            potassium,
            soil_type: DEFAULT_SOIL_TYPE.to_string(),
            district: DEFAULT_LOCATION.to_string(),
        }
    }

    pub fn with_soil_type(mut self, soil_type: impl Into<String>) -> Self {
        self.soil_type = soil_type.into();
        self
    }

    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = district.into();
        self
    }

    pub fn npk(&self) -> NpkLevels {
        NpkLevels::new(self.nitrogen, self.phosphorus, self.potassium)
    }
}

impl Default for SoilSample {
    fn default() -> Self {
        Self::new(DEFAULT_NITROGEN, DEFAULT_PHOSPHORUS, DEFAULT_POTASSIUM)
    }
}

/// Seasonal weather at the sample location
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherContext {
    /// Rainfall in mm
    pub rainfall: f64,
    /// Temperature in °C
    pub temperature: f64,
}

impl WeatherContext {
    pub fn new(rainfall: f64, temperature: f64) -> Self {
        Self {
            rainfall,
            temperature,
        }
    }
}

impl Default for WeatherContext {
    fn default() -> Self {
        Self::new(DEFAULT_RAINFALL_MM, DEFAULT_TEMPERATURE_C)
    }
}
