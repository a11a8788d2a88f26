//! System API endpoints.
//!
//! Service metadata, liveness with database connectivity, and catalog
//! statistics. Also hosts the JSON fallbacks for unknown routes and methods.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::constants::API_VERSION;
use crate::services::{CatalogStats, HealthReport, SystemError};

impl From<SystemError> for ApiError {
    fn from(err: SystemError) -> Self {
        match err {
            SystemError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub features: Vec<&'static str>,
}

/// `GET /`
pub async fn index() -> Json<ApiResponse<ServiceInfo>> {
    let endpoints = BTreeMap::from([
        ("api", "/api"),
        ("health", "/api/health"),
        ("users", "/api/users"),
        ("products", "/api/products"),
    ]);

    Json(ApiResponse::with_message(
        ServiceInfo {
            name: env!("CARGO_PKG_NAME"),
            version: API_VERSION,
            endpoints,
        },
        "Welcome to the REST API",
    ))
}

/// `GET /api`
pub async fn api_info() -> Json<ApiResponse<ApiInfo>> {
    let endpoints = BTreeMap::from([
        ("auth", "/api/auth"),
        ("health", "/api/health"),
        ("stats", "/api/stats"),
        ("users", "/api/users"),
        ("products", "/api/products"),
        ("categories", "/api/products/categories"),
        ("bulk", "/api/products/bulk"),
    ]);

    Json(ApiResponse::success(ApiInfo {
        version: API_VERSION,
        endpoints,
        features: vec![
            "JWT authentication",
            "API key authentication",
            "Role-based access control",
            "Pagination",
            "Search and filtering",
            "Sorting",
            "Rate limiting",
            "Bulk operations",
        ],
    }))
}

/// `GET /api/health`
///
/// Answers 503 when the database cannot be reached.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let report: HealthReport = state
        .system_service()
        .health(state.start_time.elapsed().as_secs())
        .await;

    let healthy = report.is_healthy();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut body = ApiResponse::success(report);
    body.success = healthy;
    (status, Json(body)).into_response()
}

/// `GET /api/stats`
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CatalogStats>>, ApiError> {
    let stats = state.system_service().stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("The requested resource was not found".to_string())
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
