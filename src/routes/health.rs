use crate::error::{ServiceError, ServiceResult};
use crate::state::{AppState, ServiceMetadata};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global service start time for uptime calculation
static SERVICE_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Health check endpoint (liveness)
/// Returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let uptime = SERVICE_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(json!({
        "status": "healthy",
        "service": "taskboard",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
    }))
}

/// Readiness check endpoint
///
/// Probes the storage connection. An unreachable database is reported as a
/// degraded component but never fails the endpoint: the service keeps
/// serving and lets individual requests fail instead.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> ServiceResult<impl IntoResponse> {
    let storage_status = match state.store.ping().await {
        Ok(()) => "ready",
        Err(_) => "unreachable",
    };

    let status = if storage_status == "ready" {
        "ready"
    } else {
        "degraded"
    };

    let uptime = SERVICE_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(Json(json!({
        "status": status,
        "service": "taskboard",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime,
        "components": {
            "api": "ready",
            "storage": storage_status,
        }
    })))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<AppState>>) -> ServiceResult<impl IntoResponse> {
    match &state.metrics {
        Some(handle) => Ok(handle.render()),
        None => Err(ServiceError::NotFound),
    }
}

/// Service metadata endpoint
pub async fn service_metadata(
    State(_state): State<Arc<AppState>>,
) -> ServiceResult<impl IntoResponse> {
    let uptime = SERVICE_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let metadata = ServiceMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
    };

    Ok(Json(serde_json::to_value(metadata)?))
}
