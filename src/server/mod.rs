//! HTTP server for the probe, metrics, and test endpoints
//!
//! Provides Kubernetes health probes:
//! - `/healthz` - Liveness probe (process is running)
//! - `/readyz` - Readiness probe (warm-up delay has elapsed)
//!
//! Also provides the Prometheus scrape endpoint, the listener with its
//! connection limits, and SIGTERM/SIGINT handling.

mod health;
pub mod listener;
pub mod metrics;
pub mod router;
pub mod shutdown;

pub use health::{healthz, readyz, spawn_warmup, ReadinessState};
pub use listener::{run_server, serve};
pub use metrics::{create_metrics, ServiceMetrics, SharedMetrics};
pub use router::{build_router, AppState};
pub use shutdown::{
    handle_signals, shutdown_channel, spawn_signal_handler, wait_for_signal, ShutdownController,
    ShutdownMode, ShutdownSignal,
};

#[cfg(test)]
#[path = "health_test.rs"]
mod health_tests;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
