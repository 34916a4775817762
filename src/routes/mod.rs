//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the taskboard
//! service. Routes are organized by functionality:
//!
//! - `health`: Health checks, readiness, and metrics
//! - `tasks`: Task CRUD (list, create, get, update, delete)

pub mod health;
pub mod tasks;

use crate::error::{ServiceError, ServiceResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns service information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn service_info() -> ServiceResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "taskboard",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/tasks",
            "/api/v1/tasks/{id}",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServiceError {
    ServiceError::NotFound
}
