//! TCP accept loop with per-connection limits
//!
//! Connections are served by hyper-util's auto builder (HTTP/1.1 and h2).
//! Limits:
//! - read: time allowed to receive a request head
//! - write: time allowed for a handler to respond (see `enforce_deadline`)
//! - idle: a connection with nothing in flight for this long is closed
//! - max header bytes: HTTP/1 read buffer bound, larger heads get 431
//!
//! On shutdown the loop stops accepting, asks every open connection to
//! finish its current request and close, and waits up to the drain timeout
//! before aborting whatever is left.

use crate::config::ServerTimeouts;
use crate::server::shutdown::ShutdownSignal;
use axum::{body::Body, Router};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tower::ServiceExt;
use tracing::{debug, error, info, warn};

/// Tracks whether a connection is doing anything
#[derive(Debug)]
struct Activity {
    in_flight: AtomicUsize,
    last_seen: Mutex<Instant>,
}

/// Held for the duration of one request
struct InFlight(Arc<Activity>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.touch();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Activity {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            last_seen: Mutex::new(Instant::now()),
        })
    }

    fn begin(self: &Arc<Self>) -> InFlight {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        InFlight(Arc::clone(self))
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// How long the connection has had no request in flight
    fn idle_for(&self) -> Duration {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return Duration::ZERO;
        }
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

fn connection_builder(timeouts: &ServerTimeouts) -> ConnBuilder<TokioExecutor> {
    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read)
        .max_buf_size(timeouts.max_header_bytes);
    builder.http2().timer(TokioTimer::new());
    builder
}

/// Serve one accepted connection until it closes, idles out, or is drained
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    timeouts: ServerTimeouts,
    mut shutdown: ShutdownSignal,
) {
    // Accepted in the same poll that shutdown fired
    if shutdown.is_shutdown() {
        debug!(peer = %peer, "Shutting down, closing new connection unserved");
        return;
    }

    let activity = Activity::new();
    let service = {
        let activity = Arc::clone(&activity);
        hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
            let router = router.clone();
            let guard = activity.begin();
            async move {
                let response = router.oneshot(request.map(Body::new)).await;
                drop(guard);
                response
            }
        })
    };

    let builder = connection_builder(&timeouts);
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let tick = (timeouts.idle / 4).max(Duration::from_millis(10));
    let mut idle_check = tokio::time::interval(tick);
    let mut closing = false;

    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    debug!(peer = %peer, error = %e, "Connection ended with error");
                }
                break;
            }
            _ = shutdown.wait(), if !closing => {
                closing = true;
                conn.as_mut().graceful_shutdown();
            }
            _ = idle_check.tick(), if !closing => {
                if activity.idle_for() >= timeouts.idle {
                    debug!(peer = %peer, "Closing idle connection");
                    closing = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
        }
    }
}

/// Accept connections on `listener` until shutdown, then drain
pub async fn serve(
    listener: TcpListener,
    router: Router,
    timeouts: ServerTimeouts,
    shutdown: ShutdownSignal,
    drain_timeout: Duration,
) -> Result<(), std::io::Error> {
    let mut tasks = JoinSet::new();
    let mut stop = shutdown.clone();

    loop {
        tokio::select! {
            // Check shutdown first so a signal stops accepting right away
            biased;

            _ = stop.wait() => {
                info!(in_flight = tasks.len(), "Stopped accepting, draining connections");
                break;
            }

            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(v) => v,
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                        continue;
                    }
                };
                tasks.spawn(serve_connection(
                    stream,
                    peer,
                    router.clone(),
                    timeouts,
                    shutdown.clone(),
                ));
            }

            // Reap finished connections so the set doesn't grow unbounded
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);

    let drained = tokio::time::timeout(drain_timeout, async {
        while tasks.join_next().await.is_some() {}
    })
    .await
    .is_ok();

    if drained {
        info!("All connections drained");
    } else {
        warn!(
            remaining = tasks.len(),
            drain_timeout_secs = drain_timeout.as_secs_f64(),
            "Drain timeout elapsed, aborting remaining connections"
        );
        tasks.shutdown().await;
    }
    Ok(())
}

/// Bind `0.0.0.0:port` and serve until shutdown
///
/// A bind failure is returned to the caller; the service cannot run
/// without its port.
pub async fn run_server(
    port: u16,
    router: Router,
    timeouts: ServerTimeouts,
    shutdown: ShutdownSignal,
    drain_timeout: Duration,
) -> Result<(), std::io::Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - server is actually listening
    info!(port = %port, "Service listening (HTTP)");

    serve(listener, router, timeouts, shutdown, drain_timeout).await
}

#[cfg(test)]
#[path = "listener_test.rs"]
mod tests;
