use axum::{
    routing::{get, post},
    Router,
    extract::{State, Query},
    extract::rejection::{JsonRejection, QueryRejection},
    Json
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use common::Error;

use crate::prediction::PredictionRequest;
use crate::services::{AnalyticsService, AppError};
use super::models::{HealthResponse, PaginatedResponse, PredictionResponse, TripQueryParams};

pub async fn health_check(
    State(service): State<Arc<AnalyticsService>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "active",
        db_path: service.dataset_path().to_string(),
    })
}

pub async fn list_trips(
    State(service): State<Arc<AnalyticsService>>,
    params: Result<Query<TripQueryParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<Vec<Value>>>, AppError> {
    let Query(params) = params.map_err(|rejection| invalid_input(rejection.body_text()))?;
    let page = params.page_request()?;
    let filter = params.filter();

    let result = service.list_trips(&filter, page).await?;

    Ok(Json(PaginatedResponse {
        data: result.rows,
        pagination: result.pagination,
    }))
}

pub async fn predict_duration(
    State(service): State<Arc<AnalyticsService>>,
    request: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(request) = request.map_err(|rejection| invalid_input(rejection.body_text()))?;
    let predicted_trip_duration = service.predict_duration(&request)?;
    info!(predicted_trip_duration, "Prediction served");

    Ok(Json(PredictionResponse { predicted_trip_duration }))
}

// Extractor rejections share the JSON error body and the 422 status
fn invalid_input(message: String) -> AppError {
    AppError(Error::InvalidInput(message))
}

// Define all API routes
pub fn routes(service: Arc<AnalyticsService>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/trips", get(list_trips))
        .route("/predict", post(predict_duration))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
