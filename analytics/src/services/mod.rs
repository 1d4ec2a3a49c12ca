pub mod analytics;
pub use analytics::AnalyticsService;

use axum::{
    response::IntoResponse,
    http::StatusCode,
    Json
};
use crate::api::models::ApiResponse;
use tracing::warn;

pub struct AppError(pub common::Error);

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self.0 {
            common::Error::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            common::Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            common::Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        warn!(status = status_code.as_u16(), error = %self.0, "Request failed");

        let body = Json(ApiResponse::<()>::error(self.0.to_string()));
        (status_code, body).into_response()
    }
}

impl From<common::Error> for AppError {
    fn from(err: common::Error) -> Self {
        AppError(err)
    }
}
