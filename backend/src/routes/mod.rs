//! Route definitions for the Crop Advisor API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/predict", prediction_routes())
}

/// Prediction routes
fn prediction_routes() -> Router<AppState> {
    Router::new()
        .route("/crop-recommendation", post(handlers::crop_recommendation))
        .route("/yield-prediction", post(handlers::yield_prediction))
        .route("/soil-analysis", post(handlers::soil_analysis))
        .route("/fertilizer-recommendation", post(handlers::fertilizer_recommendation))
}
