use anyhow::Context as _;
use probekit::config::Config;
use probekit::server::{
    build_router, create_metrics, run_server, shutdown_channel, spawn_signal_handler,
    spawn_warmup, AppState, ReadinessState,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    info!(
        port = config.port,
        ready_delay_secs = config.ready_delay.as_secs(),
        shutdown_mode = %config.shutdown_mode,
        db_configured = config.db.is_complete(),
        "Starting probekit"
    );

    // Signals are handled from the start so an early SIGTERM still stops us
    let (shutdown_controller, shutdown_signal) = shutdown_channel();
    spawn_signal_handler(config.shutdown_mode, shutdown_controller);

    // Not ready until the warm-up delay elapses
    let readiness = ReadinessState::new();
    spawn_warmup(readiness.clone(), config.ready_delay);

    let metrics = create_metrics().context("Failed to create metrics registry")?;
    info!("Prometheus metrics registry initialized");

    let state = AppState::new(readiness, metrics, config.db.clone());
    let router = build_router(state, config.timeouts.write);

    if let Err(e) = run_server(
        config.port,
        router,
        config.timeouts,
        shutdown_signal,
        config.drain_timeout,
    )
    .await
    {
        error!(error = %e, port = config.port, "Server failed");
        return Err(e.into());
    }

    info!("probekit shut down gracefully");
    Ok(())
}
