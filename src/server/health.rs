//! Kubernetes probe endpoints and the readiness state behind them
//!
//! - `/healthz` - Liveness: Is the process alive?
//! - `/readyz` - Readiness: Has the warm-up delay elapsed?

use crate::handlers::plain_text;
use crate::server::router::AppState;
use axum::{extract::State, http::StatusCode, response::Response};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Shared state for readiness tracking
///
/// Starts not ready and flips to ready exactly once. There is no way back
/// to not ready.
#[derive(Debug, Clone)]
pub struct ReadinessState {
    ready: Arc<AtomicBool>,
}

impl ReadinessState {
    /// Create a new readiness state (initially not ready)
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the service as ready
    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Check if the service is ready
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

impl Default for ReadinessState {
    fn default() -> Self {
        Self::new()
    }
}

/// Flip `readiness` to ready after `delay`, in the background
///
/// Emulates a cold start the orchestrator has to wait out. The returned
/// handle is only useful to tests; production code drops it.
pub fn spawn_warmup(readiness: ReadinessState, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(delay_secs = delay.as_secs_f64(), "Not ready, warming up");
        tokio::time::sleep(delay).await;
        readiness.set_ready();
        info!("Ready");
    })
}

/// Liveness probe handler
///
/// Always 200 - if this responds, the process is alive. Never looks at
/// readiness.
pub async fn healthz() -> Response {
    plain_text(StatusCode::OK, "OK\n")
}

/// Readiness probe handler
///
/// Returns 200 OK if ready, 503 Service Unavailable if not (or if the router
/// was built without a readiness state).
pub async fn readyz(State(state): State<AppState>) -> Response {
    match state.readiness() {
        Some(readiness) if readiness.is_ready() => plain_text(StatusCode::OK, "OK\n"),
        _ => plain_text(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable\n"),
    }
}
