//! Response serialization.
//!
//! # Responsibilities
//! - Emit the status line, header block and body in wire order
//! - Support fixed-length bodies and chunked bodies with trailers
//! - Track emission phase across calls and reject out-of-order writes
//!
//! # Design Decisions
//! - The writer owns its sink for the lifetime of one response
//! - No framing is added to fixed bodies; callers set `Content-Length`
//! - Each call issues a single `write_all` so chunk frames never interleave

use std::io;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::{canonical_name, Headers};
use crate::http::status::StatusCode;
use crate::http::CRLF;

/// Errors raised while writing a response.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("failed to write response: {0}")]
    Io(#[from] io::Error),

    #[error("cannot {operation} while the response writer is in state {state:?}")]
    OutOfOrder {
        operation: &'static str,
        state: WriterState,
    },
}

/// Emission phase of a [`ResponseWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing written yet.
    StatusLine,
    /// Status line written, header block pending.
    Headers,
    /// Headers written, body not started.
    Body,
    /// At least one chunk written, terminator pending.
    ChunkedBody,
    /// Terminating chunk written, trailer block pending.
    Trailers,
    /// Response complete.
    Done,
}

/// Starting header set for simple plain-text responses.
pub fn default_headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.merge("content-length".to_string(), &content_length.to_string());
    headers.merge("connection".to_string(), "close");
    headers.merge("content-type".to_string(), "text/plain");
    headers
}

/// Stateful HTTP/1.1 response encoder.
///
/// Calls must follow the order `write_status_line` → `write_headers` →
/// either one `write_body`, or any number of `write_chunked_body` followed by
/// `write_chunked_body_done` (and `write_trailers` if it announced trailers).
#[derive(Debug)]
pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
    status: Option<StatusCode>,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::StatusLine,
            status: None,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Status code written on the status line, once written.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Whether any part of the response has been written.
    pub fn has_started(&self) -> bool {
        self.state != WriterState::StatusLine
    }

    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), ResponseError> {
        self.require_state("write the status line", &[WriterState::StatusLine])?;

        let line = match status.reason() {
            Some(reason) => format!("HTTP/1.1 {} {}\r\n", status.as_u16(), reason),
            None => format!("HTTP/1.1 {}\r\n", status.as_u16()),
        };
        self.sink.write_all(line.as_bytes()).await?;

        self.status = Some(status);
        self.state = WriterState::Headers;
        Ok(())
    }

    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), ResponseError> {
        self.require_state("write headers", &[WriterState::Headers])?;

        self.sink.write_all(&encode_fields(headers)).await?;

        self.state = WriterState::Body;
        Ok(())
    }

    /// Write a fixed-length body in one go.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, ResponseError> {
        self.require_state("write the body", &[WriterState::Body])?;

        self.sink.write_all(body).await?;

        self.state = WriterState::Done;
        Ok(body.len())
    }

    /// Write one chunk: lowercase hex size, CRLF, data, CRLF.
    ///
    /// An empty `data` produces `0\r\n\r\n`, which a client reads as the end
    /// of the body; avoid it unless that is intended.
    pub async fn write_chunked_body(&mut self, data: &[u8]) -> Result<usize, ResponseError> {
        self.require_state(
            "write a body chunk",
            &[WriterState::Body, WriterState::ChunkedBody],
        )?;

        let size = format!("{:x}\r\n", data.len());
        let mut frame = Vec::with_capacity(size.len() + data.len() + CRLF.len());
        frame.extend_from_slice(size.as_bytes());
        frame.extend_from_slice(data);
        frame.extend_from_slice(CRLF);
        self.sink.write_all(&frame).await?;

        self.state = WriterState::ChunkedBody;
        Ok(data.len())
    }

    /// Write the terminating zero-size chunk.
    ///
    /// With `has_trailers` the final CRLF is left to [`write_trailers`](Self::write_trailers).
    pub async fn write_chunked_body_done(
        &mut self,
        has_trailers: bool,
    ) -> Result<usize, ResponseError> {
        self.require_state(
            "finish the chunked body",
            &[WriterState::Body, WriterState::ChunkedBody],
        )?;

        let terminator: &[u8] = if has_trailers { b"0\r\n" } else { b"0\r\n\r\n" };
        self.sink.write_all(terminator).await?;

        self.state = if has_trailers {
            WriterState::Trailers
        } else {
            WriterState::Done
        };
        Ok(terminator.len())
    }

    /// Write trailer fields and the blank line ending the message.
    ///
    /// Clients only honor fields announced beforehand in a `Trailer` header.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), ResponseError> {
        self.require_state("write trailers", &[WriterState::Trailers])?;

        self.sink.write_all(&encode_fields(trailers)).await?;

        self.state = WriterState::Done;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), ResponseError> {
        self.sink.flush().await?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn require_state(&self, operation: &'static str, allowed: &[WriterState]) -> Result<(), ResponseError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ResponseError::OutOfOrder {
                operation,
                state: self.state,
            })
        }
    }
}

/// `Name: value\r\n` per field, then the terminating blank line.
fn encode_fields(headers: &Headers) -> Vec<u8> {
    let mut block = Vec::new();
    for (name, value) in headers.iter() {
        block.extend_from_slice(canonical_name(name).as_bytes());
        block.extend_from_slice(b": ");
        block.extend_from_slice(value.as_bytes());
        block.extend_from_slice(CRLF);
    }
    block.extend_from_slice(CRLF);
    block
}
