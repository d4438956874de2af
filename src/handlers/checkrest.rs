//! Random failure simulator
//!
//! Each call to `/checkrest?vendor=<name>` flips a coin. Failures are counted
//! in `error_curl_total{vendor}` from a detached task, so the counter can lag
//! behind the responses a client has already seen.

use crate::handlers::plain_text;
use crate::server::router::AppState;
use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::debug;

pub const FAILED_BODY: &str = "Failed to fetch";
pub const OK_BODY: &str = "Vendor status: ok";

/// Decides whether a simulated call fails
///
/// Injected into `AppState` so tests can make the outcome deterministic.
pub trait FailureSource: Send + Sync {
    fn should_fail(&self) -> bool;
}

/// Uniform 50/50 coin
pub struct RandomFailures;

impl FailureSource for RandomFailures {
    fn should_fail(&self) -> bool {
        rand::random::<bool>()
    }
}

/// Fixed outcome for tests
#[cfg(test)]
pub struct FixedFailures(pub bool);

#[cfg(test)]
impl FailureSource for FixedFailures {
    fn should_fail(&self) -> bool {
        self.0
    }
}

/// First `vendor` value among decoded pairs
fn first_vendor(pairs: Vec<(String, String)>) -> Option<String> {
    pairs
        .into_iter()
        .find(|(key, _)| key == "vendor")
        .map(|(_, value)| value)
}

/// `GET|POST /checkrest`
///
/// The vendor comes from a form body when there is one, otherwise from the
/// query string. Missing means the empty label.
pub async fn checkrest(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let vendor = form
        .ok()
        .and_then(|Form(pairs)| first_vendor(pairs))
        .or_else(|| first_vendor(query))
        .unwrap_or_default();

    if state.failures().should_fail() {
        let metrics = state.metrics().clone();
        let label = vendor.clone();
        // Fire and forget: the response never waits on the counter
        tokio::spawn(async move {
            metrics.record_failure(&label);
        });
        debug!(vendor = %vendor, "Simulated failure");
        plain_text(StatusCode::OK, FAILED_BODY)
    } else {
        debug!(vendor = %vendor, "Simulated success");
        plain_text(StatusCode::OK, OK_BODY)
    }
}
