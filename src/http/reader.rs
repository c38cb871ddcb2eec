//! Request read loop over a byte stream.
//!
//! # Responsibilities
//! - Own the growable receive buffer for one connection
//! - Feed newly read bytes to the parser and drop what it consumed
//! - Distinguish end-of-stream from transport errors
//!
//! # Design Decisions
//! - End-of-stream simply stops reading; `RequestParser::finish` decides
//!   whether what arrived is a complete request
//! - The buffer doubles when full, starting small, so slow peers sending
//!   tiny reads never force large allocations

use std::time::Duration;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::request::{ParseError, ParseLimits, Request, RequestParser};

const INITIAL_BUFFER_SIZE: usize = 1024;

/// Reasons a connection did not produce a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read request: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?} waiting for the request")]
    Timeout(Duration),
}

impl RequestError {
    /// Short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Parse(e) => e.kind(),
            RequestError::Io(_) => "io",
            RequestError::Timeout(_) => "timeout",
        }
    }
}

/// Read and parse one request from `reader`.
pub async fn read_request<R>(reader: &mut R, limits: ParseLimits) -> Result<Request, RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = RequestParser::new(limits);
    let mut buffer = BytesMut::with_capacity(INITIAL_BUFFER_SIZE);

    while !parser.is_done() {
        if buffer.len() == buffer.capacity() {
            buffer.reserve(buffer.len().max(INITIAL_BUFFER_SIZE));
        }

        let read = reader.read_buf(&mut buffer).await?;
        if read == 0 {
            tracing::trace!(
                state = ?parser.state(),
                buffered = buffer.len(),
                "Peer closed stream"
            );
            break;
        }

        let consumed = parser.parse(&buffer)?;
        buffer.advance(consumed);

        tracing::trace!(
            read,
            consumed,
            buffered = buffer.len(),
            state = ?parser.state(),
            "Request bytes processed"
        );
    }

    Ok(parser.finish()?)
}

/// [`read_request`] bounded by a deadline for the whole request.
pub async fn read_request_with_timeout<R>(
    reader: &mut R,
    limits: ParseLimits,
    timeout: Duration,
) -> Result<Request, RequestError>
where
    R: AsyncRead + Unpin,
{
    tokio::time::timeout(timeout, read_request(reader, limits))
        .await
        .map_err(|_| RequestError::Timeout(timeout))?
}
