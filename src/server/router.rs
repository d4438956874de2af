//! Routing table, shared state, and request middleware

use crate::config::DbConfig;
use crate::handlers::{
    albums::list_albums, checkrest::checkrest, dump::print_request, echo::echo,
    identifier::uuid, method_not_allowed, not_found, plain_text, FailureSource, RandomFailures,
    RequestCounter,
};
use crate::server::health::{healthz, readyz, ReadinessState};
use crate::server::metrics::{self, SharedMetrics};
use axum::{
    extract::{Request, State},
    handler::Handler,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, MethodRouter},
    Router,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// State shared by every handler
///
/// All fields are cheap handles; cloning the state shares the underlying
/// counters and flags.
#[derive(Clone)]
pub struct AppState {
    readiness: Option<ReadinessState>,
    metrics: SharedMetrics,
    requests: RequestCounter,
    failures: Arc<dyn FailureSource>,
    db: Arc<DbConfig>,
}

impl AppState {
    /// Create state with a random failure source and a fresh request counter
    pub fn new(readiness: ReadinessState, metrics: SharedMetrics, db: DbConfig) -> Self {
        Self {
            readiness: Some(readiness),
            metrics,
            requests: RequestCounter::new(),
            failures: Arc::new(RandomFailures),
            db: Arc::new(db),
        }
    }

    /// Drop the readiness state; `/readyz` then always reports 503
    pub fn without_readiness(mut self) -> Self {
        self.readiness = None;
        self
    }

    /// Replace the failure source used by `/checkrest`
    pub fn with_failures(mut self, failures: Arc<dyn FailureSource>) -> Self {
        self.failures = failures;
        self
    }

    pub fn readiness(&self) -> Option<&ReadinessState> {
        self.readiness.as_ref()
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    pub fn requests(&self) -> &RequestCounter {
        &self.requests
    }

    pub fn failures(&self) -> &dyn FailureSource {
        self.failures.as_ref()
    }

    pub fn db(&self) -> &DbConfig {
        &self.db
    }
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Turn a panicking handler into a 500 instead of a dropped connection
pub async fn recover_panics(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            error!(path = %path, panic = %panic_message(payload.as_ref()), "Handler panicked");
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n")
        }
    }
}

/// Give every request at most `limit` to produce its response
pub async fn enforce_deadline(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(path = %path, limit_ms = limit.as_millis() as u64, "Request timed out");
            plain_text(StatusCode::SERVICE_UNAVAILABLE, "Request timed out\n")
        }
    }
}

/// GET-only route
///
/// `get` also answers HEAD; HEAD is rejected like every other method.
fn get_only<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: Handler<T, AppState>,
    T: 'static,
{
    get(handler)
        .head(method_not_allowed)
        .fallback(method_not_allowed)
}

/// Build the full routing table
///
/// Known paths answer 405 for methods they don't serve; unknown paths 404.
/// `write_timeout` bounds how long any handler may take.
pub fn build_router(state: AppState, write_timeout: Duration) -> Router {
    Router::new()
        .route("/", get_only(echo))
        .route("/healthz", get_only(healthz))
        .route("/readyz", get_only(readyz))
        .route("/checkrest", get_only(checkrest).post(checkrest))
        .route("/uuid", get_only(uuid))
        .route("/printJSONReq", get_only(print_request))
        .route("/getAlbums", get_only(list_albums))
        .route("/metrics", get_only(metrics::metrics))
        .fallback(not_found)
        .layer(middleware::from_fn(recover_panics))
        .layer(middleware::from_fn_with_state(write_timeout, enforce_deadline))
        .with_state(state)
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
