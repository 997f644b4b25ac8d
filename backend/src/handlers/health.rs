//! Health check handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::ModelVersion;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub models_loaded: bool,
    pub model_type: String,
    pub model_version: ModelVersion,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let models_loaded = state.engine.is_trained();
    let model_type = if models_loaded { "RandomForestEnsemble" } else { "Mock" };

    Json(HealthResponse {
        status: "OK".to_string(),
        service: "Crop Advisor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        models_loaded,
        model_type: model_type.to_string(),
        model_version: state.engine.model_version(),
    })
}
