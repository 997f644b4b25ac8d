//! HTTP request handlers

pub mod health;
pub mod prediction;

pub use health::health_check;
pub use prediction::{crop_recommendation, fertilizer_recommendation, soil_analysis, yield_prediction};
