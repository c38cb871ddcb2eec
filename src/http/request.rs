//! Incremental request parsing.
//!
//! # Responsibilities
//! - Recognize the request line (method, target, `HTTP/1.1`)
//! - Drive the header store until the blank line
//! - Collect exactly `Content-Length` body bytes
//! - Report consumed bytes so the caller can slide its receive buffer
//!
//! # Design Decisions
//! - Explicit state enum plus a transition function returning
//!   `(next_state, consumed)`; the driver loops until no progress is made
//! - All cursor state lives in the per-connection `RequestParser`; a
//!   `Request` only exists once parsing is complete
//! - Every error is fatal to the request; there is no resynchronization

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::http::headers::{HeaderError, Headers};
use crate::http::{find_crlf, CRLF};

/// Errors produced while turning bytes into a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("unsupported HTTP version: {0:?}")]
    UnsupportedHttpVersion(String),

    #[error("unsupported HTTP method: {0:?}")]
    UnsupportedHttpMethod(String),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("malformed content-length: {0:?}")]
    MalformedContentLength(String),

    #[error("request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },

    #[error("content-length {length} exceeds the {limit} byte body limit")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("attempted to parse request in done state")]
    ParsingInDoneState,

    #[error("body exceeds content-length: expected {expected} bytes, got {received}")]
    BodyExceedsContentLength { expected: usize, received: usize },

    #[error("body shorter than content-length: expected {expected} bytes, got {received}")]
    BodyShorterThanContentLength { expected: usize, received: usize },

    #[error("connection closed before the request head was complete")]
    IncompleteRequest,
}

impl ParseError {
    /// Short, stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedRequestLine(_) => "malformed_request_line",
            ParseError::UnsupportedHttpVersion(_) => "unsupported_version",
            ParseError::UnsupportedHttpMethod(_) => "unsupported_method",
            ParseError::Header(_) => "malformed_header",
            ParseError::MalformedContentLength(_) => "malformed_content_length",
            ParseError::HeadTooLarge { .. } => "head_too_large",
            ParseError::BodyTooLarge { .. } => "body_too_large",
            ParseError::ParsingInDoneState => "parsing_in_done_state",
            ParseError::BodyExceedsContentLength { .. } => "body_exceeds_content_length",
            ParseError::BodyShorterThanContentLength { .. } => "body_shorter_than_content_length",
            ParseError::IncompleteRequest => "incomplete_request",
        }
    }
}

/// Supported request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
        }
    }
}

impl FromStr for Method {
    type Err = ParseError;

    /// Method tokens are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "CONNECT" => Ok(Method::Connect),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            other => Err(ParseError::UnsupportedHttpMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    /// Request target exactly as sent; never decoded.
    pub target: String,
    /// Protocol version without the `HTTP/` prefix. Always `1.1`.
    pub version: String,
}

impl RequestLine {
    /// Parse a request line without its terminator.
    pub fn parse(line: &[u8]) -> Result<Self, ParseError> {
        let malformed = || ParseError::MalformedRequestLine(String::from_utf8_lossy(line).into_owned());

        let parts: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
        let [method, target, version] = parts.as_slice() else {
            return Err(malformed());
        };
        if target.is_empty() {
            return Err(malformed());
        }

        let version = match version.strip_prefix(b"HTTP/") {
            Some(b"1.1") => "1.1",
            _ => {
                return Err(ParseError::UnsupportedHttpVersion(
                    String::from_utf8_lossy(version).into_owned(),
                ))
            }
        };
        let method: Method = std::str::from_utf8(method)
            .map_err(|_| {
                ParseError::UnsupportedHttpMethod(String::from_utf8_lossy(method).into_owned())
            })?
            .parse()?;
        let target = std::str::from_utf8(target).map_err(|_| malformed())?;

        Ok(Self {
            method,
            target: target.to_string(),
            version: version.to_string(),
        })
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} HTTP/{}", self.method, self.target, self.version)
    }
}

/// Upper bounds applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum bytes for the request line plus header block.
    pub max_head_bytes: usize,
    /// Maximum accepted `Content-Length`.
    pub max_body_bytes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_head_bytes: 64 * 1024,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Parser phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Initialized,
    ParsingHeaders,
    ParsingBody,
    /// Terminal; no transition leaves it.
    Done,
}

impl ParserState {
    fn in_head(&self) -> bool {
        matches!(self, ParserState::Initialized | ParserState::ParsingHeaders)
    }
}

/// Per-connection incremental parser.
///
/// Feed it the unconsumed part of the receive buffer with [`parse`](Self::parse)
/// as bytes arrive, drop the consumed prefix, and call
/// [`finish`](Self::finish) once it reports [`ParserState::Done`] or the peer
/// stops sending.
#[derive(Debug)]
pub struct RequestParser {
    state: ParserState,
    limits: ParseLimits,
    request_line: Option<RequestLine>,
    headers: Headers,
    content_length: usize,
    body: Vec<u8>,
    head_len: usize,
}

impl RequestParser {
    pub fn new(limits: ParseLimits) -> Self {
        Self {
            state: ParserState::Initialized,
            limits,
            request_line: None,
            headers: Headers::new(),
            content_length: 0,
            body: Vec::new(),
            head_len: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Consume as much of `data` as possible, returning the number of bytes used.
    ///
    /// A return of `Ok(0)` without reaching [`ParserState::Done`] means more
    /// bytes are needed. Bytes past the end of the request are never consumed.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        if self.state == ParserState::Done {
            return Err(ParseError::ParsingInDoneState);
        }

        let mut read = 0;
        while self.state != ParserState::Done {
            let was_head = self.state.in_head();
            let (next, consumed) = self.transition(&data[read..])?;
            let progressed = consumed > 0 || next != self.state;

            self.state = next;
            read += consumed;
            if was_head {
                self.head_len += consumed;
                if self.head_len > self.limits.max_head_bytes {
                    return Err(ParseError::HeadTooLarge {
                        limit: self.limits.max_head_bytes,
                    });
                }
            }
            if !progressed {
                break;
            }
        }

        if self.state.in_head() && self.head_len + (data.len() - read) > self.limits.max_head_bytes {
            return Err(ParseError::HeadTooLarge {
                limit: self.limits.max_head_bytes,
            });
        }

        Ok(read)
    }

    /// Convert the parser into a complete request.
    ///
    /// This is the authoritative completeness check: a body shorter than the
    /// declared `Content-Length` is an error even if the stream simply ended.
    pub fn finish(self) -> Result<Request, ParseError> {
        match self.state {
            ParserState::Done => {}
            ParserState::ParsingBody => {
                return Err(ParseError::BodyShorterThanContentLength {
                    expected: self.content_length,
                    received: self.body.len(),
                })
            }
            ParserState::Initialized | ParserState::ParsingHeaders => {
                return Err(ParseError::IncompleteRequest)
            }
        }

        if self.body.len() != self.content_length {
            return Err(ParseError::BodyShorterThanContentLength {
                expected: self.content_length,
                received: self.body.len(),
            });
        }
        let request_line = self.request_line.ok_or(ParseError::IncompleteRequest)?;

        Ok(Request {
            request_line,
            headers: self.headers,
            body: self.body,
        })
    }

    fn transition(&mut self, data: &[u8]) -> Result<(ParserState, usize), ParseError> {
        match self.state {
            ParserState::Initialized => {
                let Some(end) = find_crlf(data) else {
                    return Ok((ParserState::Initialized, 0));
                };
                self.request_line = Some(RequestLine::parse(&data[..end])?);
                Ok((ParserState::ParsingHeaders, end + CRLF.len()))
            }
            ParserState::ParsingHeaders => {
                let (consumed, done) = self.headers.parse(data)?;
                if !done {
                    return Ok((ParserState::ParsingHeaders, consumed));
                }

                self.content_length = self.declared_content_length()?;
                if self.content_length > 0 {
                    self.body.reserve_exact(self.content_length);
                    Ok((ParserState::ParsingBody, consumed))
                } else {
                    Ok((ParserState::Done, consumed))
                }
            }
            ParserState::ParsingBody => {
                let remaining = self.content_length.saturating_sub(self.body.len());
                let take = remaining.min(data.len());
                self.body.extend_from_slice(&data[..take]);

                if self.body.len() > self.content_length {
                    return Err(ParseError::BodyExceedsContentLength {
                        expected: self.content_length,
                        received: self.body.len(),
                    });
                }
                if self.body.len() == self.content_length {
                    Ok((ParserState::Done, take))
                } else {
                    Ok((ParserState::ParsingBody, take))
                }
            }
            ParserState::Done => Err(ParseError::ParsingInDoneState),
        }
    }

    fn declared_content_length(&self) -> Result<usize, ParseError> {
        let Some(value) = self.headers.get("content-length") else {
            return Ok(0);
        };
        let malformed = || ParseError::MalformedContentLength(value.to_string());

        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let length: usize = value.parse().map_err(|_| malformed())?;
        if length > self.limits.max_body_bytes {
            return Err(ParseError::BodyTooLarge {
                length,
                limit: self.limits.max_body_bytes,
            });
        }
        Ok(length)
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new(ParseLimits::default())
    }
}

/// A fully received request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    request_line: RequestLine,
    headers: Headers,
    body: Vec<u8>,
}

impl Request {
    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    pub fn method(&self) -> Method {
        self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    pub fn version(&self) -> &str {
        &self.request_line.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Body bytes; always exactly `Content-Length` long.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
