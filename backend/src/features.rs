//! Feature derivation shared by training and inference
//!
//! [`FeatureEngineer::derive`] is the only place a [`FeatureVector`] is
//! built, so the trainer and the serving path can never disagree on column
//! order or derived ratios.

use serde::{Deserialize, Serialize};
use shared::{SoilSample, WeatherContext};

use crate::error::{AppError, AppResult};

/// Number of columns in a [`FeatureVector`]
pub const FEATURE_COUNT: usize = 13;

/// Column names in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "nitrogen",
    "phosphorus",
    "potassium",
    "rainfall",
    "temperature",
    "soil_type_encoded",
    "district_encoded",
    "npk_ratio",
    "pk_ratio",
    "total_nutrients",
    "nutrient_balance",
    "rainfall_nitrogen",
    "temp_phosphorus",
];

/// Label encoder over a fixed, sorted category set.
///
/// Values never seen during fitting map to a reserved code one past the last
/// fitted code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryEncoder {
    categories: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Code reserved for unseen values
    pub fn unknown_code(&self) -> usize {
        self.categories.len()
    }

    pub fn encode(&self, value: &str) -> usize {
        let value = value.trim();
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(code) => code,
            Err(_) => {
                tracing::debug!(value, "unseen category, using reserved code");
                self.unknown_code()
            }
        }
    }
}

/// Fixed-order model input for one soil and weather profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub rainfall: f64,
    pub temperature: f64,
    pub soil_type_encoded: f64,
    pub district_encoded: f64,
    pub npk_ratio: f64,
    pub pk_ratio: f64,
    pub total_nutrients: f64,
    pub nutrient_balance: f64,
    pub rainfall_nitrogen: f64,
    pub temp_phosphorus: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.rainfall,
            self.temperature,
            self.soil_type_encoded,
            self.district_encoded,
            self.npk_ratio,
            self.pk_ratio,
            self.total_nutrients,
            self.nutrient_balance,
            self.rainfall_nitrogen,
            self.temp_phosphorus,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }
}

/// Fitted categorical encoders plus the derivation formulas
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureEngineer {
    pub soil_type: CategoryEncoder,
    pub district: CategoryEncoder,
}

impl FeatureEngineer {
    /// Fit encoders on the categorical columns of the training samples
    pub fn fit(samples: &[SoilSample]) -> AppResult<Self> {
        if samples.is_empty() {
            return Err(AppError::Training("cannot fit encoders on zero samples".into()));
        }
        Ok(Self {
            soil_type: CategoryEncoder::fit(samples.iter().map(|s| s.soil_type.as_str())),
            district: CategoryEncoder::fit(samples.iter().map(|s| s.district.as_str())),
        })
    }

    pub fn derive(&self, sample: &SoilSample, weather: &WeatherContext) -> FeatureVector {
        let n = sample.nitrogen;
        let p = sample.phosphorus;
        let k = sample.potassium;
        FeatureVector {
            nitrogen: n,
            phosphorus: p,
            potassium: k,
            rainfall: weather.rainfall,
            temperature: weather.temperature,
            soil_type_encoded: self.soil_type.encode(&sample.soil_type) as f64,
            district_encoded: self.district.encode(&sample.district) as f64,
            npk_ratio: n / (p + k + 1.0),
            pk_ratio: p / (k + 1.0),
            total_nutrients: n + p + k,
            nutrient_balance: (n - p - k).abs(),
            rainfall_nitrogen: weather.rainfall * n / 1000.0,
            temp_phosphorus: weather.temperature * p / 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn engineer() -> FeatureEngineer {
        let samples = vec![
            SoilSample::new(1.0, 1.0, 1.0).with_soil_type("sandy").with_district("Ludhiana"),
            SoilSample::new(1.0, 1.0, 1.0).with_soil_type("clayey").with_district("Amritsar"),
            SoilSample::new(1.0, 1.0, 1.0).with_soil_type("sandy").with_district("Patiala"),
        ];
        FeatureEngineer::fit(&samples).unwrap()
    }

    #[test]
    fn encoder_codes_follow_sorted_order() {
        let enc = CategoryEncoder::fit(["wheat", "bajra", " rice ", "bajra"]);
        assert_eq!(enc.categories(), &["bajra", "rice", "wheat"]);
        assert_eq!(enc.encode("rice"), 1);
        assert_eq!(enc.encode("  wheat"), 2);
    }

    #[test]
    fn unseen_category_gets_reserved_code() {
        let eng = engineer();
        assert_eq!(eng.district.encode("Bathinda"), 3);
        assert_eq!(eng.soil_type.encode("Sandy"), 2);
    }

    #[test]
    fn derived_columns() {
        let eng = engineer();
        let sample = SoilSample::new(150.0, 40.0, 100.0)
            .with_soil_type("sandy")
            .with_district("Ludhiana");
        let v = eng.derive(&sample, &WeatherContext::new(700.0, 25.0));

        assert_eq!(v.soil_type_encoded, 1.0);
        assert_eq!(v.district_encoded, 1.0);
        assert_relative_eq!(v.npk_ratio, 150.0 / 141.0);
        assert_relative_eq!(v.pk_ratio, 40.0 / 101.0);
        assert_eq!(v.total_nutrients, 290.0);
        assert_eq!(v.nutrient_balance, 10.0);
        assert_relative_eq!(v.rainfall_nitrogen, 105.0);
        assert_relative_eq!(v.temp_phosphorus, 10.0);
        assert_eq!(v.to_vec().len(), FEATURE_COUNT);
    }

    #[test]
    fn zero_nutrients_do_not_divide_by_zero() {
        let v = engineer().derive(&SoilSample::new(0.0, 0.0, 0.0), &WeatherContext::default());
        assert!(v.to_array().iter().all(|x| x.is_finite()));
    }
}
