//! Crop Advisor backend
//!
//! Crop recommendation, yield prediction, soil health and fertilizer advice
//! for Punjab field conditions, served over HTTP and trained offline.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod artifacts;
pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod ml;
pub mod routes;
pub mod services;
pub mod training;

pub use crate::config::Config;
pub use services::RecommendationEngine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine, config: Config) -> Self {
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Crop Advisor API v2.0"
}
