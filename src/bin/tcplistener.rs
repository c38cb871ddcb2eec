//! Accepts TCP connections and prints each parsed request.
//!
//! Useful with `curl` or `nc` to see exactly what the parser makes of a
//! client's bytes. Connections are handled one at a time and nothing is
//! written back.

use clap::Parser;
use tokio::net::TcpListener;

use httpfromtcp::cli::ServerArgs;
use httpfromtcp::http::{read_request_with_timeout, Request};
use httpfromtcp::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "tcplistener")]
#[command(about = "Print HTTP requests parsed from raw TCP connections", long_about = None)]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.server.resolve_config()?;
    logging::init_logging(&config.observability.log_level);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let limits = config.limits.parse_limits();
    let timeout = config.timeouts.request_read();

    loop {
        let (mut stream, peer_addr) = listener.accept().await?;
        tracing::info!(peer_addr = %peer_addr, "Connection accepted");

        match read_request_with_timeout(&mut stream, limits, timeout).await {
            Ok(request) => print!("{}", render(&request)),
            Err(e) => println!("Error: {e}"),
        }

        tracing::info!(peer_addr = %peer_addr, "Connection closed");
    }
}

fn render(request: &Request) -> String {
    let line = request.request_line();
    let mut out = format!(
        "Request line:\n- Method: {}\n- Target: {}\n- Version: {}\nHeaders:\n",
        line.method, line.target, line.version
    );
    for (name, value) in request.headers() {
        out.push_str(&format!("- {name}: {value}\n"));
    }
    out.push_str("Body:\n");
    out.push_str(&String::from_utf8_lossy(request.body()));
    out.push('\n');
    out
}
