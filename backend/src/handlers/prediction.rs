//! HTTP handlers for the prediction endpoints

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    validate_area, validate_soil_sample, validate_weather, FertilizerAdvice, FullReport,
    ModelVersion, NpkLevels, PredictionRequest, Recommendation, SoilHealthReport, SoilSample,
    WeatherContext, YieldPrediction,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Request inputs after defaults were applied
#[derive(Debug, Serialize)]
pub struct InputData {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub rainfall: f64,
    pub temperature: f64,
    pub soil_type: String,
}

impl InputData {
    fn new(sample: &SoilSample, weather: &WeatherContext) -> Self {
        Self {
            nitrogen: sample.nitrogen,
            phosphorus: sample.phosphorus,
            potassium: sample.potassium,
            rainfall: weather.rainfall,
            temperature: weather.temperature,
            soil_type: sample.soil_type.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CropRecommendationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: FullReport,
    pub location: String,
    pub input_data: InputData,
    pub timestamp: DateTime<Utc>,
    pub model_version: ModelVersion,
}

#[derive(Debug, Serialize)]
pub struct YieldPredictionResponse {
    pub success: bool,
    pub prediction: YieldPrediction,
    pub recommendations: Vec<Recommendation>,
    pub location: String,
    pub input_data: InputData,
    pub timestamp: DateTime<Utc>,
    pub model_version: ModelVersion,
}

#[derive(Debug, Serialize)]
pub struct SoilAnalysisResponse {
    pub success: bool,
    pub soil_health: SoilHealthReport,
    pub npk_levels: NpkLevels,
    pub timestamp: DateTime<Utc>,
    pub model_version: ModelVersion,
}

#[derive(Debug, Serialize)]
pub struct FertilizerResponse {
    pub success: bool,
    pub crop_type: String,
    pub fertilizer_recommendations: Vec<FertilizerAdvice>,
    pub soil_levels: NpkLevels,
    pub timestamp: DateTime<Utc>,
    pub model_version: ModelVersion,
}

/// Unwrap the JSON body and return the validated soil sample
fn validated_sample(
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<(PredictionRequest, SoilSample)> {
    let Json(request) = payload?;
    let sample = request.soil_sample();
    sample.validate()?;
    validate_soil_sample(&sample).map_err(|message| AppError::Validation {
        field: "soil_data".to_string(),
        message: message.to_string(),
    })?;
    Ok((request, sample))
}

fn validated_weather(request: &PredictionRequest) -> AppResult<WeatherContext> {
    let weather = request.weather();
    validate_weather(&weather).map_err(|message| AppError::Validation {
        field: "weather_data".to_string(),
        message: message.to_string(),
    })?;
    Ok(weather)
}

/// Ranked crops with fertilizer advice and soil health
pub async fn crop_recommendation(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<CropRecommendationResponse>> {
    let (request, sample) = validated_sample(payload)?;
    let weather = validated_weather(&request)?;
    let location = request.location();

    let result = state.engine.full_report(&sample, &weather, &location)?;
    Ok(Json(CropRecommendationResponse {
        success: true,
        report: result.value,
        location,
        input_data: InputData::new(&sample, &weather),
        timestamp: Utc::now(),
        model_version: result.model_version,
    }))
}

/// Expected yield and total production for a crop over an area
pub async fn yield_prediction(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<YieldPredictionResponse>> {
    let (request, sample) = validated_sample(payload)?;
    let weather = validated_weather(&request)?;
    let area = request.area();
    validate_area(area).map_err(|message| AppError::Validation {
        field: "area".to_string(),
        message: message.to_string(),
    })?;
    let location = request.location();

    let result = state.engine.predict_yield(
        &sample,
        &weather,
        &location,
        &request.crop_type(),
        area,
    )?;
    Ok(Json(YieldPredictionResponse {
        success: true,
        prediction: result.value.prediction,
        recommendations: result.value.recommendations,
        location,
        input_data: InputData::new(&sample, &weather),
        timestamp: Utc::now(),
        model_version: result.model_version,
    }))
}

/// Soil health category and advice
pub async fn soil_analysis(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<SoilAnalysisResponse>> {
    let (_, sample) = validated_sample(payload)?;

    let result = state.engine.analyze_soil(&sample)?;
    Ok(Json(SoilAnalysisResponse {
        success: true,
        soil_health: result.value,
        npk_levels: sample.npk(),
        timestamp: Utc::now(),
        model_version: result.model_version,
    }))
}

/// Fertilizer quantities to close each nutrient deficit
pub async fn fertilizer_recommendation(
    State(state): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> AppResult<Json<FertilizerResponse>> {
    let (request, sample) = validated_sample(payload)?;
    let crop_type = request.crop_type();

    let result = state.engine.fertilizer_for(&sample, &crop_type);
    Ok(Json(FertilizerResponse {
        success: true,
        crop_type,
        fertilizer_recommendations: result.value,
        soil_levels: sample.npk(),
        timestamp: Utc::now(),
        model_version: result.model_version,
    }))
}
