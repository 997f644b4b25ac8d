//! Shared types and agronomy formulas for the Crop Advisor platform
//!
//! This crate contains the domain model and the model-free formulas
//! (suitability scoring, fertilizer dosing, soil health advice) shared between
//! the backend, the offline trainer, and the browser (via WASM).

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
