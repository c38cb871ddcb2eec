//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use httpfromtcp::http::{Handler, HttpServer, ServerError};
use httpfromtcp::net::listener::Listener;
use httpfromtcp::{ServerConfig, Shutdown};

/// Reader that hands out at most `per_read` bytes per read, then EOF.
pub struct ChunkReader {
    data: Vec<u8>,
    per_read: usize,
    pos: usize,
}

impl ChunkReader {
    pub fn new(data: impl AsRef<[u8]>, per_read: usize) -> Self {
        Self {
            data: data.as_ref().to_vec(),
            per_read,
            pos: 0,
        }
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let start = self.pos;
        let end = (start + self.per_read)
            .min(self.data.len())
            .min(start + buf.remaining());
        buf.put_slice(&self.data[start..end]);
        self.pos = end;
        Poll::Ready(Ok(()))
    }
}

/// A server running on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Trigger shutdown and wait for the server to finish draining.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        self.handle.await.expect("server task panicked")
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

pub async fn start_server<H: Handler>(config: ServerConfig, handler: H) -> TestServer {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let server = HttpServer::new(&config, handler);
    let handle = tokio::spawn(server.run(listener, rx));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Send `request`, then read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    read_all(&mut stream).await
}

/// Like [`send_raw`] but half-closes the write side first, so the server
/// sees end-of-stream right after `request`.
pub async fn send_raw_then_close(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();
    read_all(&mut stream).await
}

async fn read_all(stream: &mut TcpStream) -> String {
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

/// Split a response into its head (without the blank line) and body.
pub fn split_response(response: &str) -> (&str, &str) {
    response
        .split_once("\r\n\r\n")
        .expect("response has no header terminator")
}

/// Decode a chunked body, returning the payload and the trailer lines.
pub fn decode_chunked(mut body: &[u8]) -> (Vec<u8>, Vec<String>) {
    let mut payload = Vec::new();
    loop {
        let line_end = find(body, b"\r\n").expect("chunk size line");
        let size_hex = std::str::from_utf8(&body[..line_end]).unwrap();
        let size = usize::from_str_radix(size_hex, 16).unwrap();
        body = &body[line_end + 2..];
        if size == 0 {
            break;
        }
        payload.extend_from_slice(&body[..size]);
        assert_eq!(&body[size..size + 2], b"\r\n", "chunk not CRLF terminated");
        body = &body[size + 2..];
    }

    let mut trailers = Vec::new();
    loop {
        let line_end = find(body, b"\r\n").expect("trailer line");
        if line_end == 0 {
            assert_eq!(body.len(), 2, "bytes after the final CRLF");
            break;
        }
        trailers.push(String::from_utf8(body[..line_end].to_vec()).unwrap());
        body = &body[line_end + 2..];
    }
    (payload, trailers)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Start a mock upstream that answers every request with `body`.
///
/// The request head is read before replying so clients never see a reset.
pub async fn start_mock_backend(content_type: &'static str, body: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let body = body.clone();
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while find(&head, b"\r\n\r\n").is_none() {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            content_type,
                            body.len()
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
