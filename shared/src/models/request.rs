//! Raw prediction request schema
//!
//! Absent or `null` fields fall back to fixed domain defaults. Fields that are
//! present with the wrong JSON type are rejected by deserialization.

use serde::{Deserialize, Serialize};

use crate::models::soil::*;

pub const DEFAULT_CROP_TYPE: &str = "wheat";
pub const DEFAULT_AREA_HA: f64 = 1.0;

/// Soil block of a prediction request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoilInput {
    #[serde(default)]
    pub nitrogen: Option<f64>,
    #[serde(default)]
    pub phosphorus: Option<f64>,
    #[serde(default)]
    pub potassium: Option<f64>,
    #[serde(default)]
    pub soil_type: Option<String>,
}

/// Weather block of a prediction request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherInput {
    #[serde(default)]
    pub rainfall: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Body accepted by every prediction endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(default)]
    pub soil_data: Option<SoilInput>,
    #[serde(default)]
    pub weather_data: Option<WeatherInput>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub crop_type: Option<String>,
    #[serde(default)]
    pub area: Option<f64>,
}

impl PredictionRequest {
    pub fn location(&self) -> String {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_LOCATION)
            .to_string()
    }

    /// Soil sample with defaults applied; the district is the request location
    pub fn soil_sample(&self) -> SoilSample {
        let soil = self.soil_data.clone().unwrap_or_default();
        SoilSample {
            nitrogen: soil.nitrogen.unwrap_or(DEFAULT_NITROGEN),
            phosphorus: soil.phosphorus.unwrap_or(DEFAULT_PHOSPHORUS),
            potassium: soil.potassium.unwrap_or(DEFAULT_POTASSIUM),
            soil_type: soil
                .soil_type
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SOIL_TYPE.to_string()),
            district: self.location(),
        }
    }

    pub fn weather(&self) -> WeatherContext {
        let weather = self.weather_data.clone().unwrap_or_default();
        WeatherContext {
            rainfall: weather.rainfall.unwrap_or(DEFAULT_RAINFALL_MM),
            temperature: weather.temperature.unwrap_or(DEFAULT_TEMPERATURE_C),
        }
    }

    pub fn crop_type(&self) -> String {
        self.crop_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CROP_TYPE)
            .to_string()
    }

    pub fn area(&self) -> f64 {
        self.area.unwrap_or(DEFAULT_AREA_HA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_uses_defaults() {
        let request: PredictionRequest = serde_json::from_str("{}").unwrap();
        let sample = request.soil_sample();
        assert_eq!(sample.nitrogen, 150.0);
        assert_eq!(sample.phosphorus, 40.0);
        assert_eq!(sample.potassium, 100.0);
        assert_eq!(sample.soil_type, "loamy");
        assert_eq!(sample.district, "Unknown");
        assert_eq!(request.weather(), WeatherContext::new(700.0, 25.0));
        assert_eq!(request.crop_type(), "wheat");
        assert_eq!(request.area(), 1.0);
    }

    #[test]
    fn nulls_are_treated_as_missing() {
        let request: PredictionRequest = serde_json::from_str(
            r#"{"soil_data": {"nitrogen": null, "phosphorus": 12.5}, "weather_data": null}"#,
        )
        .unwrap();
        let sample = request.soil_sample();
        assert_eq!(sample.nitrogen, 150.0);
        assert_eq!(sample.phosphorus, 12.5);
        assert_eq!(request.weather().rainfall, 700.0);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let result: Result<PredictionRequest, _> =
            serde_json::from_str(r#"{"soil_data": {"nitrogen": "lots"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn location_becomes_district() {
        let request: PredictionRequest =
            serde_json::from_str(r#"{"location": " Ludhiana "}"#).unwrap();
        assert_eq!(request.soil_sample().district, "Ludhiana");
    }
}
