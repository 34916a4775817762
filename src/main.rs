//! taskboard - HTTP REST API for task management
//!
//! This binary serves the task CRUD API and owns the process lifecycle:
//! it runs until a termination signal arrives, then exits with the status
//! the shutdown coordinator reports.

use std::process::ExitCode;
use taskboard::ServiceConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before configuration so it sees the variables
    dotenvy::dotenv().ok();

    let config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    match taskboard::server::run(config).await {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(err) => {
            tracing::error!(error = %err, "server failed to start");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &ServiceConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .init();
}
