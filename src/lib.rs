//! taskboard - Task CRUD REST API over MongoDB
//!
//! This crate provides a small HTTP service exposing task management via a
//! REST API, backed by a MongoDB collection. It supports:
//!
//! - **Task CRUD**: list, create, fetch, update, and delete tasks
//! - **Health & Metrics**: liveness/readiness probes and Prometheus-compatible metrics
//! - **Coordinated Shutdown**: a lifecycle coordinator that drains the
//!   listener before closing storage, with a hard grace-period deadline
//!
//! # Features
//!
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: Environment variable and file-based configuration
//! - **Error Handling**: Comprehensive error responses with error codes
//! - **Graceful Shutdown**: SIGTERM/SIGINT handled identically, at most one
//!   shutdown sequence per process, forced exit after the grace period
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use taskboard::ServiceConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::load()?;
//!     let report = taskboard::server::run(config).await?;
//!     std::process::exit(report.exit_code() as i32);
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (reports storage reachability)
//! - `GET /metrics` - Prometheus metrics
//! - `GET /api/v1/tasks` - List tasks
//! - `POST /api/v1/tasks` - Create task
//! - `GET /api/v1/tasks/{id}` - Fetch task by id
//! - `PUT /api/v1/tasks/{id}` - Partially update task
//! - `DELETE /api/v1/tasks/{id}` - Delete task
//! - `GET /api/v1/metadata` - Service metadata

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod model;
pub mod routes;
pub mod server;
pub mod state;
pub mod storage;

pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use lifecycle::{
    LifecycleEvent, ShutdownCoordinator, ShutdownOutcome, ShutdownReport, TerminationSignal,
    DEFAULT_GRACE_PERIOD,
};
pub use model::{NewTask, Task, TaskChanges};
pub use server::{build_router, run};
pub use state::AppState;
pub use storage::TaskStore;
