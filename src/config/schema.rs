//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::ParseLimits;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub listener: ListenerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    pub timeouts: TimeoutConfig,

    pub observability: ObservabilityConfig,

    /// Settings for the demo routes.
    pub demo: DemoConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:42069").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:42069".to_string(),
            max_connections: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Request line plus header block.
    pub max_head_bytes: usize,

    /// Largest accepted `Content-Length`.
    pub max_body_bytes: usize,
}

impl LimitsConfig {
    pub fn parse_limits(&self) -> ParseLimits {
        ParseLimits {
            max_head_bytes: self.max_head_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = ParseLimits::default();
        Self {
            max_head_bytes: limits.max_head_bytes,
            max_body_bytes: limits.max_body_bytes,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for receiving the whole request.
    pub request_read_secs: u64,

    /// How long in-flight connections may run after shutdown starts.
    pub shutdown_secs: u64,

    /// Deadline for the upstream response head on proxied routes.
    pub upstream_secs: u64,
}

impl TimeoutConfig {
    pub fn request_read(&self) -> Duration {
        Duration::from_secs(self.request_read_secs)
    }

    pub fn shutdown(&self) -> Duration {
        Duration::from_secs(self.shutdown_secs)
    }

    pub fn upstream(&self) -> Duration {
        Duration::from_secs(self.upstream_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_read_secs: 30,
            shutdown_secs: 10,
            upstream_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Base URL that `/httpbin<rest>` is forwarded to.
    pub upstream_base_url: String,

    /// Largest chunk written when relaying the upstream body.
    pub proxy_chunk_size: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: "https://httpbin.org".to_string(),
            proxy_chunk_size: 32,
        }
    }
}
