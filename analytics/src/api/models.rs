use crate::query::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::query::{PageRequest, PaginationMeta, TripFilter};
use common::Result;
use serde::{Deserialize, Serialize};

// Request models
#[derive(Debug, Deserialize)]
pub struct TripQueryParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub vendor_id: Option<i64>,
    pub passenger_count: Option<i64>,
    pub pickup_day: Option<i64>,
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
}

fn default_page() -> i64 {
    DEFAULT_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl TripQueryParams {
    pub fn filter(&self) -> TripFilter {
        TripFilter {
            vendor_id: self.vendor_id,
            passenger_count: self.passenger_count,
            pickup_day: self.pickup_day,
            min_duration: self.min_duration,
            max_duration: self.max_duration,
        }
    }

    pub fn page_request(&self) -> Result<PageRequest> {
        PageRequest::new(self.page, self.limit)
    }
}

// Response models
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: T,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub predicted_trip_duration: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_path: String,
}
