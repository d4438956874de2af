//! probekit: a small HTTP service for exercising Kubernetes probes and
//! Prometheus scraping.
//!
//! - `config` - flags and environment
//! - `server` - readiness, metrics, router, listener, shutdown
//! - `handlers` - the non-probe endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
