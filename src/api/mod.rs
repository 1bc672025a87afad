//! REST API endpoints.
//!
//! Axum-based HTTP API exposing the analytics and the card/date catalogs.
//! Every endpoint is a `GET` with query parameters and answers with a JSON
//! array of rows; dates are `YYYY-MM-DD`.

pub mod routes;
pub mod state;

use axum::{
    extract::rejection::QueryRejection,
    http::{header::InvalidHeaderValue, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::models::TimeRange;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// `[start, end)` from two calendar dates.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<TimeRange, ApiError> {
    if end < start {
        return Err(ApiError::BadRequest(format!(
            "end date {} is before start date {}",
            end, start
        )));
    }
    Ok(TimeRange::from_dates(start, end))
}

/// Optional range: both dates or neither.
pub fn optional_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Option<TimeRange>, ApiError> {
    match (start, end) {
        (Some(start), Some(end)) => date_range(start, end).map(Some),
        (None, None) => Ok(None),
        _ => Err(ApiError::BadRequest(
            "start and end must be given together".to_string(),
        )),
    }
}

/// Reject NaN and infinite thresholds.
pub fn finite(name: &str, value: f64) -> Result<f64, ApiError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!("{} must be a finite number", name)))
    }
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// CORS for the given origin; `*` allows any origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::exact(HeaderValue::from_str(origin)?)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET]))
}

/// All routes, with request tracing.
pub fn build_router(state: AppState) -> Router {
    use routes::{catalog, queries};

    Router::new()
        .route("/api/health", get(catalog::health))
        .route("/api/cards", get(catalog::cards))
        .route("/api/dates", get(catalog::dates))
        .route("/api/victory-percentage", get(queries::victory_percentage))
        .route("/api/high-win-decks", get(queries::high_win_decks))
        .route("/api/defeats-with-combo", get(queries::defeats_with_combo))
        .route("/api/specific-victories", get(queries::specific_victories))
        .route("/api/high-win-combos", get(queries::high_win_combos))
        .route("/api/win-rate-shift", get(queries::win_rate_shift))
        .route("/api/win-usage-scatter", get(queries::win_usage_scatter))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
