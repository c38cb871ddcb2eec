//! Connection-per-request HTTP server.
//!
//! # Responsibilities
//! - Accept TCP connections through the bounded [`Listener`]
//! - Run one task per connection: read a request, dispatch, close
//! - Turn read failures into a best-effort 500 response
//! - Drain in-flight connections on shutdown, aborting after a deadline
//!
//! # Design Decisions
//! - Connection tasks live in a `JoinSet` owned by the accept loop, so
//!   shutdown can wait on exactly the tasks it spawned
//! - Every connection runs inside a span carrying its id and peer address
//! - No keep-alive: the response always ends the connection

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

use crate::config::ServerConfig;
use crate::http::handler::{Handler, HandlerError};
use crate::http::reader::{read_request_with_timeout, RequestError};
use crate::http::request::ParseLimits;
use crate::http::response::ResponseWriter;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Listener, ListenerError};
use crate::observability::metrics;

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-connection settings derived from [`ServerConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub limits: ParseLimits,
    pub read_timeout: Duration,
}

impl ConnectionSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            limits: config.limits.parse_limits(),
            read_timeout: config.timeouts.request_read(),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// HTTP/1.1 server dispatching every request to one [`Handler`].
pub struct HttpServer<H> {
    handler: Arc<H>,
    settings: ConnectionSettings,
    shutdown_timeout: Duration,
    tracker: ConnectionTracker,
}

impl<H: Handler> HttpServer<H> {
    pub fn new(config: &ServerConfig, handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            settings: ConnectionSettings::from_config(config),
            shutdown_timeout: config.timeouts.shutdown(),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Serve until `shutdown` fires (or its sender is dropped), then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        let guard = self.tracker.track();
                        let span = tracing::info_span!(
                            "connection",
                            connection_id = %guard.id(),
                            peer_addr = %peer_addr,
                        );
                        let handler = Arc::clone(&self.handler);
                        let settings = self.settings;

                        connections.spawn(
                            async move {
                                let _permit = permit;
                                let _guard = guard;
                                serve_connection(stream, handler.as_ref(), settings).await;
                            }
                            .instrument(span),
                        );
                    }
                    Err(ListenerError::Closed) => {
                        tracing::error!("Listener closed, stopping accept loop");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    log_join(joined);
                }
            }
        }

        drop(listener);
        self.drain(&mut connections).await;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn drain(&self, connections: &mut JoinSet<()>) {
        if connections.is_empty() {
            return;
        }
        tracing::info!(
            in_flight = connections.len(),
            active = self.tracker.active_count(),
            timeout = ?self.shutdown_timeout,
            "Draining connections"
        );

        let drained = tokio::time::timeout(self.shutdown_timeout, async {
            while let Some(joined) = connections.join_next().await {
                log_join(joined);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = connections.len(),
                "Drain deadline reached, aborting connections"
            );
            connections.abort_all();
            while connections.join_next().await.is_some() {}
        }
    }
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "Connection task panicked");
        }
    }
}

/// Serve exactly one request on `stream` and close it.
///
/// Generic over the stream so it can be driven by in-memory pipes.
pub async fn serve_connection<S, H>(stream: S, handler: &H, settings: ConnectionSettings)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: Handler,
{
    let start = Instant::now();
    let mut stream = stream;

    let request = read_request_with_timeout(&mut stream, settings.limits, settings.read_timeout).await;
    let mut writer = ResponseWriter::new(BufWriter::new(stream));

    match request {
        Ok(request) => {
            tracing::debug!(
                method = %request.method(),
                target = %request.target(),
                body_bytes = request.body().len(),
                "Request received"
            );

            if let Err(err) = handler.handle(&mut writer, &request).await {
                if writer.has_started() {
                    tracing::warn!(error = %err, state = ?writer.state(), "Handler failed mid-response");
                } else {
                    tracing::debug!(error = %err, "Handler returned an error response");
                    if let Err(e) = err.write_to(&mut writer).await {
                        tracing::debug!(error = %e, "Failed to write error response");
                    }
                }
            }

            let status = writer.status().map(|s| s.as_u16()).unwrap_or(0);
            metrics::record_request(request.method().as_str(), status, start);
            tracing::info!(
                method = %request.method(),
                target = %request.target(),
                status,
                elapsed = ?start.elapsed(),
                "Request served"
            );
        }
        Err(err) => {
            metrics::record_request_error(err.kind());
            match &err {
                RequestError::Io(e) => {
                    tracing::debug!(error = %e, "Connection failed before a request was read");
                }
                _ => {
                    tracing::warn!(error = %err, kind = err.kind(), "Rejecting request");
                    let response = HandlerError::internal(err.to_string());
                    if let Err(e) = response.write_to(&mut writer).await {
                        tracing::debug!(error = %e, "Failed to write error response");
                    }
                }
            }
        }
    }

    if let Err(e) = writer.flush().await {
        tracing::debug!(error = %e, "Failed to flush response");
    }
    let mut stream = writer.into_inner().into_inner();
    if let Err(e) = stream.shutdown().await {
        tracing::trace!(error = %e, "Failed to shut down stream");
    }
}
