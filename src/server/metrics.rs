//! Prometheus metrics for the service
//!
//! One counter family, `error_curl_total{vendor}`, fed by the failure
//! simulator and scraped from `/metrics`. On Linux the standard `process_*`
//! families (CPU, memory, file descriptors) are exported alongside it.

use crate::server::router::AppState;
use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tracing::error;

/// Name of the simulated downstream failure counter
pub const CURL_ERRORS_NAME: &str = "error_curl_total";

/// Metrics owned by one service instance
///
/// Each instance has its own registry, so tests never share counters.
pub struct ServiceMetrics {
    registry: Registry,
    curl_errors: IntCounterVec,
}

/// Handle passed to handlers and background tasks
pub type SharedMetrics = Arc<ServiceMetrics>;

impl ServiceMetrics {
    /// Build the registry and register every metric
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let curl_errors = IntCounterVec::new(
            Opts::new(CURL_ERRORS_NAME, "Total curl request failed"),
            &["vendor"],
        )?;
        registry.register(Box::new(curl_errors.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            curl_errors,
        })
    }

    /// Count one failed call for `vendor`
    ///
    /// An unseen vendor starts at zero.
    pub fn record_failure(&self, vendor: &str) {
        self.curl_errors.with_label_values(&[vendor]).inc();
    }

    /// Current failure count for `vendor` (0 if never recorded)
    ///
    /// Reads the collected snapshot rather than the vec so that asking about
    /// an unseen vendor doesn't create its series.
    pub fn failure_count(&self, vendor: &str) -> u64 {
        self.curl_errors
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|label| label.get_name() == "vendor" && label.get_value() == vendor)
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Encode every registered metric in Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Create the shared metrics registry
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    ServiceMetrics::new().map(Arc::new)
}

/// Prometheus metrics handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics().encode() {
        Ok(body) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod tests;
