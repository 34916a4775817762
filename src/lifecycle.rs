//! Coordinated shutdown of the listener and the storage connection.
//!
//! A [`ShutdownCoordinator`] owns the transition from serving to terminated.
//! The first termination signal moves the process into draining: the
//! listener stops accepting, in-flight requests run to completion, and only
//! once the listener reports drained does the storage close begin. A grace
//! timer armed at the moment draining starts races the whole sequence; if
//! it wins, the process is forced down without waiting further.
//!
//! The coordinator never retries: every failure on this path is terminal
//! because the process is already committed to exiting. It reports what
//! happened through an ordered event journal in the [`ShutdownReport`] and
//! mirrors each transition onto the log stream.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Default grace period between the termination signal and forced exit
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Which termination signal arrived. Both are handled identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT / ctrl-c
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => write!(f, "SIGINT"),
            TerminationSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// One observable step of the shutdown sequence, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// First termination signal accepted; draining begins
    ShutdownInitiated(TerminationSignal),
    /// Listener drained and the socket is closed
    ListenerClosed,
    /// Listener failed to close cleanly
    ListenerFailed(String),
    /// Storage connections released
    StorageClosed,
    /// Storage close failed or was rejected
    StorageFailed(String),
    /// Every resource closed cleanly
    ShutdownComplete,
    /// Grace period elapsed before the sequence finished
    GracePeriodExpired,
}

/// Terminal outcome of the shutdown sequence. Exactly one per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Listener drained and storage closed in time
    Clean,
    /// Listener reported an error while closing; storage close was skipped
    ListenerFailed,
    /// Storage close reported an error after the listener drained
    StorageFailed,
    /// Grace period expired mid-sequence
    TimedOut,
}

/// What the shutdown sequence did, for the caller to act on
#[derive(Debug)]
pub struct ShutdownReport {
    pub outcome: ShutdownOutcome,
    /// Ordered journal of every lifecycle event emitted
    pub events: Vec<LifecycleEvent>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.outcome == ShutdownOutcome::Clean
    }

    /// Process exit status: zero only for a clean shutdown
    pub fn exit_code(&self) -> u8 {
        match self.outcome {
            ShutdownOutcome::Clean => 0,
            ShutdownOutcome::ListenerFailed
            | ShutdownOutcome::StorageFailed
            | ShutdownOutcome::TimedOut => 1,
        }
    }
}

/// Single-use coordinator for the drain-then-close sequence.
///
/// Created once at startup and shared with the signal watcher and the
/// serve loop. The first [`request`](Self::request) wins; later signals
/// are absorbed so a repeat SIGINT during draining cannot restart or
/// escalate the sequence.
pub struct ShutdownCoordinator {
    grace_period: Duration,
    trigger: OnceLock<TerminationSignal>,
    triggered: Notify,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            trigger: OnceLock::new(),
            triggered: Notify::new(),
        }
    }

    /// Record a termination request. Returns `true` only for the first
    /// call; duplicates are logged at debug level and otherwise ignored.
    pub fn request(&self, signal: TerminationSignal) -> bool {
        if self.trigger.set(signal).is_ok() {
            self.triggered.notify_waiters();
            true
        } else {
            tracing::debug!(signal = %signal, "termination signal ignored, shutdown already in progress");
            false
        }
    }

    /// Wait until a termination request has been recorded.
    ///
    /// This is what the listener's graceful-shutdown future awaits; it is
    /// non-blocking with respect to request handling.
    pub async fn requested(&self) -> TerminationSignal {
        loop {
            let notified = self.triggered.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if let Some(signal) = self.trigger.get() {
                return *signal;
            }
            notified.await;
        }
    }

    /// Drive the shutdown sequence to its terminal outcome.
    ///
    /// Suspends until a termination request arrives, then arms the grace
    /// timer and runs drain-then-close. `drain` must resolve when the
    /// listener has stopped accepting and every in-flight request has
    /// finished; `close` is invoked only after that, never concurrently.
    /// If the timer fires first the sequence is abandoned where it stands
    /// and the report says so; nothing attempts to cancel the in-progress
    /// operation because the process exits right after.
    pub async fn run<D, DE, C, F, CE>(&self, drain: D, close: C) -> ShutdownReport
    where
        D: Future<Output = Result<(), DE>>,
        DE: fmt::Display,
        C: FnOnce() -> F,
        F: Future<Output = Result<(), CE>>,
        CE: fmt::Display,
    {
        let signal = self.requested().await;

        let journal = Mutex::new(Vec::with_capacity(4));
        record(&journal, LifecycleEvent::ShutdownInitiated(signal));

        let grace = tokio::time::sleep(self.grace_period);
        tokio::pin!(grace);

        let sequence = async {
            match drain.await {
                Ok(()) => record(&journal, LifecycleEvent::ListenerClosed),
                Err(err) => {
                    record(&journal, LifecycleEvent::ListenerFailed(err.to_string()));
                    return ShutdownOutcome::ListenerFailed;
                }
            }

            match close().await {
                Ok(()) => record(&journal, LifecycleEvent::StorageClosed),
                Err(err) => {
                    record(&journal, LifecycleEvent::StorageFailed(err.to_string()));
                    return ShutdownOutcome::StorageFailed;
                }
            }

            record(&journal, LifecycleEvent::ShutdownComplete);
            ShutdownOutcome::Clean
        };

        let outcome = tokio::select! {
            outcome = sequence => outcome,
            () = &mut grace => {
                record(&journal, LifecycleEvent::GracePeriodExpired);
                ShutdownOutcome::TimedOut
            }
        };

        ShutdownReport {
            outcome,
            events: journal
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Emit the event on the log stream and append it to the journal.
/// Every transition goes through here exactly once.
fn record(journal: &Mutex<Vec<LifecycleEvent>>, event: LifecycleEvent) {
    match &event {
        LifecycleEvent::ShutdownInitiated(signal) => {
            tracing::info!(signal = %signal, "shutdown initiated, draining listener");
        }
        LifecycleEvent::ListenerClosed => {
            tracing::info!("listener drained, socket closed");
        }
        LifecycleEvent::ListenerFailed(err) => {
            tracing::error!(error = %err, "listener failed to close");
        }
        LifecycleEvent::StorageClosed => {
            tracing::info!("storage connections closed");
        }
        LifecycleEvent::StorageFailed(err) => {
            tracing::error!(error = %err, "storage close failed");
        }
        LifecycleEvent::ShutdownComplete => {
            tracing::info!("shutdown complete");
        }
        LifecycleEvent::GracePeriodExpired => {
            tracing::warn!("shutdown grace period expired, forcing exit");
        }
    }

    journal
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event);
}
