//! Shutdown handling
//!
//! Handles SIGTERM and SIGINT. Two behaviors are available:
//! - `graceful`: stop accepting connections, let in-flight requests finish
//!   (bounded by the drain timeout), then exit. A second signal during the
//!   drain exits on the spot.
//! - `immediate`: log and exit on the spot, dropping in-flight requests

use futures::{Stream, StreamExt};
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// What the process does when a termination signal arrives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShutdownMode {
    #[default]
    Graceful,
    Immediate,
}

impl FromStr for ShutdownMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graceful" => Ok(ShutdownMode::Graceful),
            "immediate" => Ok(ShutdownMode::Immediate),
            other => Err(format!("unknown shutdown mode: {}", other)),
        }
    }
}

impl fmt::Display for ShutdownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownMode::Graceful => f.write_str("graceful"),
            ShutdownMode::Immediate => f.write_str("immediate"),
        }
    }
}

/// Receiving side of the shutdown channel
///
/// Cloned into every component that needs to stop.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                // Sender dropped, treat as shutdown
                break;
            }
        }
    }

    /// Check if shutdown was signaled (non-blocking)
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Controller for triggering shutdown
pub struct ShutdownController {
    sender: watch::Sender<bool>,
}

impl ShutdownController {
    /// Trigger shutdown
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
        info!("Shutdown signal sent");
    }
}

/// Create a new shutdown signal pair
///
/// Returns (controller, signal) where:
/// - controller: Used to trigger shutdown
/// - signal: Cloned and passed to components that need to listen
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownController { sender }, ShutdownSignal { receiver })
}

/// Wait for SIGTERM or SIGINT signal
///
/// Returns the signal name that was received.
///
/// # Panics
/// Panics if signal handlers cannot be registered (OS resource exhaustion).
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::error;

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to register SIGTERM handler");
            panic!("Cannot register SIGTERM handler: {}", e);
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to register SIGINT handler");
            panic!("Cannot register SIGINT handler: {}", e);
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
            "SIGTERM"
        }
        _ = sigint.recv() => {
            info!("Received SIGINT");
            "SIGINT"
        }
    }
}

/// Wait for Ctrl+C signal (Windows)
///
/// # Panics
/// Panics if Ctrl+C handler cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    use tracing::error;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to wait for Ctrl+C");
        panic!("Cannot wait for Ctrl+C: {}", e);
    }
    info!("Received Ctrl+C");
    "CTRL_C"
}

/// React to termination signals as they arrive on `signals`
///
/// Returns the exit code once the process has to stop without waiting for
/// the listener, or `None` if `signals` ends first.
pub async fn handle_signals<S>(
    mode: ShutdownMode,
    controller: ShutdownController,
    mut signals: S,
) -> Option<i32>
where
    S: Stream<Item = &'static str> + Unpin,
{
    let signal = signals.next().await?;
    match mode {
        ShutdownMode::Immediate => {
            info!(signal = signal, "Caught signal, exiting immediately");
            Some(0)
        }
        ShutdownMode::Graceful => {
            info!(signal = signal, "Caught signal, draining connections");
            controller.shutdown();

            let signal = signals.next().await?;
            warn!(signal = signal, "Caught second signal, exiting without draining");
            Some(1)
        }
    }
}

/// Install the termination signal handler
///
/// In `Immediate` mode the process exits as soon as a signal arrives. In
/// `Graceful` mode the controller is triggered and the listener drains; a
/// second signal exits with status 1.
pub fn spawn_signal_handler(mode: ShutdownMode, controller: ShutdownController) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signals = Box::pin(futures::stream::unfold((), |()| async {
            Some((wait_for_signal().await, ()))
        }));
        if let Some(code) = handle_signals(mode, controller, signals).await {
            std::process::exit(code);
        }
    })
}
