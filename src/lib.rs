//! HTTP/1.1 over raw TCP: incremental request parsing, chunked responses
//! with trailers, and a small connection-per-request server.

pub mod cli;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
