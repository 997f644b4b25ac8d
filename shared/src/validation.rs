//! Validation utilities for prediction inputs

use crate::models::{SoilSample, WeatherContext};

/// Largest accepted nutrient level (kg/ha)
pub const MAX_NUTRIENT_LEVEL: f64 = 10_000.0;
/// Largest accepted annual rainfall (mm)
pub const MAX_RAINFALL_MM: f64 = 20_000.0;
/// Accepted temperature range (°C)
pub const TEMPERATURE_RANGE: (f64, f64) = (-60.0, 70.0);
/// Largest accepted planted area (hectares)
pub const MAX_AREA_HECTARES: f64 = 1_000_000.0;

// ============================================================================
// Soil Validations
// ============================================================================

/// Validate a single nutrient level (kg/ha)
pub fn validate_nutrient_level(level: f64) -> Result<(), &'static str> {
    if !level.is_finite() {
        return Err("Nutrient level must be a finite number");
    }
    if level < 0.0 {
        return Err("Nutrient level cannot be negative");
    }
    if level > MAX_NUTRIENT_LEVEL {
        return Err("Nutrient level exceeds 10000 kg/ha");
    }
    Ok(())
}

/// Validate all three nutrient levels of a sample
pub fn validate_soil_sample(sample: &SoilSample) -> Result<(), &'static str> {
    validate_nutrient_level(sample.nitrogen)?;
    validate_nutrient_level(sample.phosphorus)?;
    validate_nutrient_level(sample.potassium)?;
    Ok(())
}

// ============================================================================
// Weather and Field Validations
// ============================================================================

/// Validate weather readings
pub fn validate_weather(weather: &WeatherContext) -> Result<(), &'static str> {
    if !weather.rainfall.is_finite() || !weather.temperature.is_finite() {
        return Err("Weather readings must be finite numbers");
    }
    if weather.rainfall < 0.0 {
        return Err("Rainfall cannot be negative");
    }
    if weather.rainfall > MAX_RAINFALL_MM {
        return Err("Rainfall exceeds 20000 mm");
    }
    let (min_temp, max_temp) = TEMPERATURE_RANGE;
    if weather.temperature < min_temp || weather.temperature > max_temp {
        return Err("Temperature must be between -60 and 70 °C");
    }
    Ok(())
}

/// Validate planted area in hectares
pub fn validate_area(area: f64) -> Result<(), &'static str> {
    if !area.is_finite() || area <= 0.0 {
        return Err("Area must be a positive number of hectares");
    }
    if area > MAX_AREA_HECTARES {
        return Err("Area exceeds 1000000 hectares");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nutrient_levels() {
        assert!(validate_nutrient_level(0.0).is_ok());
        assert!(validate_nutrient_level(250.5).is_ok());
        assert!(validate_nutrient_level(-0.1).is_err());
        assert!(validate_nutrient_level(f64::INFINITY).is_err());
        assert!(validate_nutrient_level(MAX_NUTRIENT_LEVEL).is_ok());
        assert_eq!(
            validate_nutrient_level(1e308),
            Err("Nutrient level exceeds 10000 kg/ha")
        );
    }

    #[test]
    fn weather_readings() {
        assert!(validate_weather(&WeatherContext::new(700.0, -5.0)).is_ok());
        assert!(validate_weather(&WeatherContext::new(-1.0, 25.0)).is_err());
        assert!(validate_weather(&WeatherContext::new(700.0, f64::NAN)).is_err());
        assert!(validate_weather(&WeatherContext::new(1e308, 25.0)).is_err());
        assert!(validate_weather(&WeatherContext::new(700.0, 1e300)).is_err());
        assert!(validate_weather(&WeatherContext::new(700.0, -80.0)).is_err());
    }

    #[test]
    fn area_must_be_positive() {
        assert!(validate_area(1.0).is_ok());
        assert!(validate_area(0.0).is_err());
        assert!(validate_area(-2.0).is_err());
        assert!(validate_area(1e308).is_err());
    }

    #[test]
    fn sample_validation_checks_every_nutrient() {
        let sample = SoilSample::new(100.0, 40.0, -3.0);
        assert_eq!(
            validate_soil_sample(&sample),
            Err("Nutrient level cannot be negative")
        );
        let huge = SoilSample::new(1e308, 40.0, 30.0);
        assert_eq!(
            validate_soil_sample(&huge),
            Err("Nutrient level exceeds 10000 kg/ha")
        );
    }
}
