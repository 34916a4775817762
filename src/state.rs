use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::storage::TaskStore;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Arc<ServiceConfig>,

    /// Task store (shared connection pool)
    pub store: TaskStore,

    /// Prometheus render handle, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub async fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let store = TaskStore::connect(&config).await?;

        let metrics = if config.metrics_enabled {
            install_metrics_recorder()
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            store,
            metrics,
        })
    }
}

/// The recorder is process-global and can only be installed once; a second
/// install (another state in the same process) keeps the existing recorder
/// and serves no render handle.
fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::warn!(error = %err, "metrics recorder not installed");
            None
        }
    }
}

/// Service metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServiceMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
