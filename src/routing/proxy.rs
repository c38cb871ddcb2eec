//! Upstream relay for `/httpbin` routes.
//!
//! # Responsibilities
//! - Forward the request target to the configured upstream
//! - Re-emit the upstream body as a chunked response in small pieces
//! - Append `X-Content-Length` and `X-Content-SHA256` trailers
//!
//! # Design Decisions
//! - The upstream status and `Content-Type` are passed through
//! - The digest covers exactly the bytes relayed
//! - A body failure leaves the chunked body unterminated, so the client
//!   sees a truncated response rather than a short one that looks whole

use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncWrite;

use crate::config::DemoConfig;
use crate::http::{HeaderError, Headers, ResponseError, ResponseWriter, StatusCode};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream {url} did not respond within {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("upstream body failed after {relayed} bytes: {source}")]
    Body {
        relayed: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

/// Relays GET requests to a fixed upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamProxy {
    client: reqwest::Client,
    base_url: String,
    chunk_size: usize,
    timeout: Duration,
}

impl UpstreamProxy {
    pub fn new(config: &DemoConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.upstream_base_url.trim_end_matches('/').to_string(),
            chunk_size: config.proxy_chunk_size.max(1),
            timeout,
        })
    }

    pub fn upstream_url(&self, rest: &str) -> String {
        format!("{}{}", self.base_url, rest)
    }

    /// Fetch `<base><rest>` and stream it into `writer`.
    ///
    /// Errors before the status line leave `writer` untouched.
    pub async fn relay<W>(&self, writer: &mut ResponseWriter<W>, rest: &str) -> Result<(), ProxyError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let url = self.upstream_url(rest);
        let mut upstream = match tokio::time::timeout(self.timeout, self.client.get(&url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => return Err(ProxyError::Request { url, source }),
            Err(_) => {
                return Err(ProxyError::Timeout {
                    url,
                    timeout: self.timeout,
                })
            }
        };

        let content_type = upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        let mut headers = Headers::new();
        headers.set("Content-Type", &content_type)?;
        headers.set("Transfer-Encoding", "chunked")?;
        headers.set("Trailer", "X-Content-Length")?;
        headers.set("Trailer", "X-Content-SHA256")?;

        tracing::debug!(
            url = %url,
            upstream_status = upstream.status().as_u16(),
            "Relaying upstream response"
        );

        writer
            .write_status_line(StatusCode::from(upstream.status().as_u16()))
            .await?;
        writer.write_headers(&headers).await?;

        let mut hasher = Sha256::new();
        let mut relayed = 0usize;
        loop {
            let bytes = match upstream.chunk().await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => break,
                Err(source) => return Err(ProxyError::Body { relayed, source }),
            };
            for piece in bytes.chunks(self.chunk_size) {
                writer.write_chunked_body(piece).await?;
            }
            hasher.update(&bytes);
            relayed += bytes.len();
        }

        writer.write_chunked_body_done(true).await?;

        let mut trailers = Headers::new();
        trailers.set("X-Content-Length", &relayed.to_string())?;
        trailers.set("X-Content-SHA256", &hex(&hasher.finalize()))?;
        writer.write_trailers(&trailers).await?;

        tracing::debug!(url = %url, relayed, "Upstream body relayed");
        Ok(())
    }
}

fn hex(digest: &[u8]) -> String {
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
