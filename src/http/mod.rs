//! HTTP/1.1 protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (byte stream, arbitrary read sizes)
//!     → reader.rs (growable receive buffer, read loop, EOF handling)
//!     → request.rs (incremental state machine: request line → headers → body)
//!     → headers.rs (line-oriented header parsing, duplicate merging)
//!     → handler.rs (user handler receives the completed Request)
//!     → response.rs (status line, headers, fixed or chunked body, trailers)
//!     → Send to client, close connection
//! ```
//!
//! # Design Decisions
//! - Parsing never assumes a read boundary lines up with a protocol boundary
//! - The parser is synchronous and pure over an in-memory buffer; only the
//!   reader and writer touch the socket
//! - Exactly one request per connection (no keep-alive, no pipelining)
//! - Body length is governed exclusively by `Content-Length`

pub mod handler;
pub mod headers;
pub mod reader;
pub mod request;
pub mod response;
pub mod server;
pub mod status;

pub use handler::{Handler, HandlerError};
pub use headers::{HeaderError, Headers};
pub use reader::{read_request, read_request_with_timeout, RequestError};
pub use request::{Method, ParseError, ParseLimits, ParserState, Request, RequestLine, RequestParser};
pub use response::{default_headers, ResponseError, ResponseWriter, WriterState};
pub use server::{serve_connection, ConnectionSettings, HttpServer, ServerError};
pub use status::StatusCode;

/// Line separator used by every line-oriented part of HTTP/1.1.
pub(crate) const CRLF: &[u8] = b"\r\n";

/// Position of the first `\r\n` in `data`, if any.
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|window| window == CRLF)
}
