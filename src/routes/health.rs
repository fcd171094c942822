//! Health and service-info endpoints.

use axum::{extract::State, Json};

use crate::output::{HealthStatus, ServiceInfo};
use crate::server::AppState;

/// Health check endpoint.
/// GET /health
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

/// Service name, version and available routes.
/// GET /
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo::new(state.config.service_name.as_str()))
}
