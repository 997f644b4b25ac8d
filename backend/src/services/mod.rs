//! Services behind the prediction endpoints

pub mod recommendation;
pub mod soil_health;

pub use recommendation::{RecommendationEngine, Versioned, YieldForecast};
pub use soil_health::{rank_cluster_labels, SoilHealthModel};
