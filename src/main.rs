//! httpfromtcp demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──TCP──▶ net::Listener ──▶ http::HttpServer (task per connection)
//!                                          │
//!                                          ├─ reader: bytes → RequestParser → Request
//!                                          ├─ routing::DemoRouter (Handler)
//!                                          │     ├─ /yourproblem, /myproblem, /  → HTML
//!                                          │     └─ /httpbin…  → upstream, chunked + trailers
//!                                          └─ ResponseWriter → close
//!
//!     lifecycle: SIGINT/SIGTERM → Shutdown → stop accepting → drain
//! ```

use clap::Parser;

use httpfromtcp::cli::ServerArgs;
use httpfromtcp::http::HttpServer;
use httpfromtcp::lifecycle::{wait_for_signal, Shutdown};
use httpfromtcp::net::listener::Listener;
use httpfromtcp::observability::{logging, metrics};
use httpfromtcp::routing::DemoRouter;

#[derive(Debug, Parser)]
#[command(name = "httpfromtcp")]
#[command(about = "HTTP/1.1 server built directly on TCP", long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.server.resolve_config()?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "httpfromtcp starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_read_secs = config.timeouts.request_read_secs,
        upstream = %config.demo.upstream_base_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = Listener::bind(&config.listener).await?;
    let router = DemoRouter::new(&config)?;
    let server = HttpServer::new(&config, router);

    let shutdown = Shutdown::new();
    let signals = shutdown.clone();
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => tracing::info!(signal = name, "Shutting down gracefully"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for signals, shutting down"),
        }
        signals.trigger();

        if let Ok(name) = wait_for_signal().await {
            tracing::warn!(signal = name, "Second signal received, exiting immediately");
            std::process::exit(130);
        }
    });

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Server gracefully stopped");
    Ok(())
}
