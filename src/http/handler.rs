//! Handler contract between the transport and application code.

use std::future::Future;

use thiserror::Error;
use tokio::io::AsyncWrite;

use crate::http::headers::HeaderError;
use crate::http::request::Request;
use crate::http::response::{default_headers, ResponseError, ResponseWriter};
use crate::http::status::StatusCode;

/// Error a handler returns instead of writing a response itself.
///
/// The server renders it as a minimal plain-text response, provided the
/// handler had not started writing yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Write status line, default headers and the message as body.
    pub async fn write_to<W>(&self, writer: &mut ResponseWriter<W>) -> Result<(), ResponseError>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_status_line(self.status).await?;
        writer
            .write_headers(&default_headers(self.message.len()))
            .await?;
        writer.write_body(self.message.as_bytes()).await?;
        Ok(())
    }
}

impl From<HeaderError> for HandlerError {
    fn from(err: HeaderError) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<ResponseError> for HandlerError {
    fn from(err: ResponseError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Produces the response for one parsed request.
///
/// Implementations drive the [`ResponseWriter`] themselves; the connection
/// is closed after `handle` returns. Implement it with `async fn`:
///
/// ```no_run
/// use httpfromtcp::http::{Handler, HandlerError, Headers, Request, ResponseWriter, StatusCode};
/// use tokio::io::AsyncWrite;
///
/// struct Hello;
///
/// impl Handler for Hello {
///     async fn handle<W>(&self, w: &mut ResponseWriter<W>, _req: &Request) -> Result<(), HandlerError>
///     where
///         W: AsyncWrite + Unpin + Send,
///     {
///         let mut headers = Headers::new();
///         headers.set("Content-Length", "5")?;
///         w.write_status_line(StatusCode::OK).await?;
///         w.write_headers(&headers).await?;
///         w.write_body(b"hello").await?;
///         Ok(())
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn handle<W>(
        &self,
        writer: &mut ResponseWriter<W>,
        request: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}
