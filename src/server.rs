//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (logging, compression, CORS, timeouts)
//! - Signal wiring into the shutdown coordinator
//! - The drain-then-close run loop

use crate::config::ServiceConfig;
use crate::lifecycle::{ShutdownCoordinator, ShutdownReport, TerminationSignal};
use crate::middleware::{log_requests, request_id};
use crate::routes::{health, not_found, service_info, tasks};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Routes are divided into:
/// - Operational routes: /, /health, /ready, /metrics
/// - Task routes: /api/v1/tasks CRUD
///
/// Middleware stack (applied in reverse order):
/// 1. Request ID tracking
/// 2. Request logging
/// 3. Timeout handling
/// 4. Compression
/// 5. CORS
/// 6. Body size limit
pub fn build_router(state: Arc<AppState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    // Operational routes
    let operational_routes = Router::new()
        .route("/", get(service_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/api/v1/metadata", get(health::service_metadata));

    // Task CRUD
    let task_routes = Router::new()
        .route("/api/v1/tasks", get(tasks::list_tasks))
        .route("/api/v1/tasks", post(tasks::create_task))
        .route("/api/v1/tasks/{id}", get(tasks::get_task))
        .route("/api/v1/tasks/{id}", put(tasks::update_task))
        .route("/api/v1/tasks/{id}", delete(tasks::delete_task));

    // Combine routes
    Router::new()
        .merge(operational_routes)
        .merge(task_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the taskboard HTTP service and block until it terminates.
///
/// Binds the listener, installs the termination-signal watcher, and serves
/// requests until SIGTERM or ctrl-c arrives. From that point the shutdown
/// coordinator owns the process: it drains the listener, closes storage,
/// and reports the terminal outcome. The caller maps the report to the
/// process exit code.
pub async fn run(config: ServiceConfig) -> anyhow::Result<ShutdownReport> {
    let state = Arc::new(AppState::new(config.clone()).await?);

    // Startup reachability probe. Runs in the background so a down
    // database never delays listening; requests fail individually until
    // storage recovers.
    {
        let store = state.store.clone();
        let database = config.mongo_database.clone();
        tokio::spawn(async move {
            match store.ping().await {
                Ok(()) => {
                    tracing::info!(database = %database, "storage connection established");
                }
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        "storage unreachable at startup, requests will fail until it recovers"
                    );
                }
            }
        });
    }

    let app = build_router(state.clone());
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Starting taskboard on {}", addr);
    tracing::info!(
        "Timeout: {}s, Max body: {}MB, Shutdown grace: {}s",
        config.timeout_secs,
        config.max_body_size_mb,
        config.shutdown_grace_secs
    );
    tracing::info!(
        "CORS: {}, Metrics: {}",
        config.enable_cors,
        config.metrics_enabled
    );

    let coordinator = Arc::new(ShutdownCoordinator::new(config.shutdown_grace()));
    spawn_signal_watcher(coordinator.clone());

    // The serve future resolves once the listener has stopped accepting
    // and every in-flight request has finished; that resolution is the
    // listener-drained signal the coordinator sequences on.
    let serve = {
        let coordinator = coordinator.clone();
        axum::serve(listener, app).with_graceful_shutdown(async move {
            coordinator.requested().await;
        })
    };
    let server_task = tokio::spawn(async move { serve.await });

    let drain = async move {
        match server_task.await {
            Ok(result) => result,
            Err(join_error) => Err(std::io::Error::other(join_error)),
        }
    };

    let store = state.store.clone();
    let report = coordinator
        .run(drain, move || async move { store.close().await })
        .await;

    Ok(report)
}

/// Watch for termination signals for the life of the process.
///
/// Stays armed after the first signal so repeats are absorbed by the
/// coordinator's at-most-once guard instead of falling through to the
/// default handler and killing the process mid-drain.
fn spawn_signal_watcher(coordinator: Arc<ShutdownCoordinator>) {
    tokio::spawn(async move {
        loop {
            let signal = termination_signal().await;
            coordinator.request(signal);
        }
    });
}

/// Resolve when a termination signal arrives, reporting which one
async fn termination_signal() -> TerminationSignal {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => TerminationSignal::Interrupt,
        _ = terminate => TerminationSignal::Terminate,
    }
}
