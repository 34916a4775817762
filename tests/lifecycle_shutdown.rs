//! Integration tests for the shutdown sequence against a real listener.
//!
//! These drive the actual drain machinery: a bound TCP listener served by
//! axum with its graceful-shutdown future wired to the coordinator, and a
//! real HTTP client on the other side.

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use taskboard::lifecycle::{
    LifecycleEvent, ShutdownCoordinator, ShutdownOutcome, TerminationSignal,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;

async fn slow_handler() -> &'static str {
    sleep(Duration::from_millis(300)).await;
    "done"
}

/// Bind an ephemeral listener and serve `app` with graceful shutdown wired
/// to the coordinator. Returns the bound address and the serve task whose
/// completion is the listener-drained signal.
async fn spawn_server(
    app: Router,
    coordinator: Arc<ShutdownCoordinator>,
) -> (std::net::SocketAddr, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        coordinator.requested().await;
    });
    let task = tokio::spawn(async move { serve.await });

    (addr, task)
}

fn drain(task: JoinHandle<std::io::Result<()>>) -> impl std::future::Future<Output = std::io::Result<()>> {
    async move {
        match task.await {
            Ok(result) => result,
            Err(join_error) => Err(std::io::Error::other(join_error)),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_request_completes_across_trigger() {
    let app = Router::new().route("/slow", get(slow_handler));
    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(5)));
    let (addr, server_task) = spawn_server(app, coordinator.clone()).await;

    let request = tokio::spawn(async move { reqwest::get(format!("http://{addr}/slow")).await });

    // Let the request reach the handler, then pull the trigger while the
    // response is still pending.
    sleep(Duration::from_millis(50)).await;
    assert!(coordinator.request(TerminationSignal::Terminate));

    let response = request.await.unwrap().unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "done");

    let report = coordinator
        .run(drain(server_task), || async { Ok::<(), std::io::Error>(()) })
        .await;

    assert!(report.is_clean());
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn idle_server_shuts_down_cleanly_and_stops_accepting() {
    let app = Router::new().route("/slow", get(slow_handler));
    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(5)));
    let (addr, server_task) = spawn_server(app, coordinator.clone()).await;

    coordinator.request(TerminationSignal::Interrupt);

    let report = coordinator
        .run(drain(server_task), || async { Ok::<(), std::io::Error>(()) })
        .await;

    assert_eq!(report.outcome, ShutdownOutcome::Clean);
    assert_eq!(
        report.events,
        vec![
            LifecycleEvent::ShutdownInitiated(TerminationSignal::Interrupt),
            LifecycleEvent::ListenerClosed,
            LifecycleEvent::StorageClosed,
            LifecycleEvent::ShutdownComplete,
        ]
    );

    // The socket is gone; new connections must be refused.
    assert!(reqwest::get(format!("http://{addr}/slow")).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_triggers_run_one_shutdown_sequence() {
    let app = Router::new().route("/slow", get(slow_handler));
    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(5)));
    let (_addr, server_task) = spawn_server(app, coordinator.clone()).await;

    assert!(coordinator.request(TerminationSignal::Terminate));
    assert!(!coordinator.request(TerminationSignal::Terminate));
    assert!(!coordinator.request(TerminationSignal::Interrupt));

    let report = coordinator
        .run(drain(server_task), || async { Ok::<(), std::io::Error>(()) })
        .await;

    let initiated = report
        .events
        .iter()
        .filter(|e| matches!(e, LifecycleEvent::ShutdownInitiated(_)))
        .count();
    assert_eq!(initiated, 1);
    assert!(report.is_clean());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn storage_failure_surfaces_in_report() {
    let app = Router::new().route("/slow", get(slow_handler));
    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(5)));
    let (_addr, server_task) = spawn_server(app, coordinator.clone()).await;

    coordinator.request(TerminationSignal::Terminate);

    let report = coordinator
        .run(drain(server_task), || async {
            Err(std::io::Error::other("connection pool wedged"))
        })
        .await;

    assert_eq!(report.outcome, ShutdownOutcome::StorageFailed);
    assert_eq!(report.exit_code(), 1);
    // The listener still drained before the failing close was attempted.
    assert_eq!(report.events[1], LifecycleEvent::ListenerClosed);
}
