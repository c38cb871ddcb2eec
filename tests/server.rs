//! End-to-end tests over real TCP connections.

mod common;

use std::time::Duration;

use common::{send_raw, send_raw_then_close, split_response, start_server, test_config};
use httpfromtcp::http::{Handler, HandlerError, Headers, Request, ResponseWriter, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Echoes method, target and body back as plain text.
struct Echo;

impl Handler for Echo {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, req: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut body = format!("{} {}\n", req.method(), req.target()).into_bytes();
        body.extend_from_slice(req.body());

        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain")?;
        headers.set("Content-Length", &body.len().to_string())?;
        w.write_status_line(StatusCode::OK).await?;
        w.write_headers(&headers).await?;
        w.write_body(&body).await?;
        Ok(())
    }
}

/// Streams the request target back one byte per chunk, with a trailer.
struct Chunky;

impl Handler for Chunky {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, req: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut headers = Headers::new();
        headers.set("Transfer-Encoding", "chunked")?;
        headers.set("Trailer", "X-Count")?;
        w.write_status_line(StatusCode::OK).await?;
        w.write_headers(&headers).await?;
        for byte in req.target().as_bytes() {
            w.write_chunked_body(std::slice::from_ref(byte)).await?;
        }
        w.write_chunked_body_done(true).await?;

        let mut trailers = Headers::new();
        trailers.set("X-Count", &req.target().len().to_string())?;
        w.write_trailers(&trailers).await?;
        Ok(())
    }
}

/// Sleeps before answering, to hold a connection open across shutdown.
struct Slow(Duration);

impl Handler for Slow {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, _req: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        tokio::time::sleep(self.0).await;
        let mut headers = Headers::new();
        headers.set("Content-Length", "4")?;
        w.write_status_line(StatusCode::OK).await?;
        w.write_headers(&headers).await?;
        w.write_body(b"done").await?;
        Ok(())
    }
}

#[tokio::test]
async fn serves_request_and_closes_connection() {
    let server = start_server(test_config(), Echo).await;

    let response = send_raw(
        server.addr,
        b"POST /submit HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    assert_eq!(
        response,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 18\r\n\r\nPOST /submit\nhello"
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn request_trickled_byte_by_byte() {
    let server = start_server(test_config(), Echo).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    for byte in b"GET /slowly HTTP/1.1\r\nHost: localhost\r\n\r\n" {
        stream.write_all(&[*byte]).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    let (_, body) = split_response(&response);
    assert_eq!(body, "GET /slowly\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn malformed_request_gets_500_with_error_text() {
    let server = start_server(test_config(), Echo).await;

    let response = send_raw(server.addr, b"GET / HTTP/1.0\r\nHost: localhost\r\n\r\n").await;
    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(head.contains("Connection: close"));
    assert!(head.contains(&format!("Content-Length: {}", body.len())));
    assert_eq!(body, "unsupported HTTP version: \"HTTP/1.0\"");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn truncated_body_gets_500() {
    let server = start_server(test_config(), Echo).await;

    let response = send_raw_then_close(
        server.addr,
        b"POST /submit HTTP/1.1\r\nContent-Length: 200\r\n\r\npartial content",
    )
    .await;
    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 500 "));
    assert_eq!(
        body,
        "body shorter than content-length: expected 200 bytes, got 15"
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn chunked_response_with_trailers_over_tcp() {
    let server = start_server(test_config(), Chunky).await;

    let response = send_raw(server.addr, b"GET /abc HTTP/1.1\r\n\r\n").await;
    let (head, body) = split_response(&response);
    assert_eq!(
        head,
        "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nTrailer: X-Count"
    );
    assert_eq!(body, "1\r\n/\r\n1\r\na\r\n1\r\nb\r\n1\r\nc\r\n0\r\nX-Count: 4\r\n\r\n");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn interoperates_with_an_http_client() {
    let server = start_server(test_config(), Chunky).await;

    let text = reqwest::get(format!("http://{}/hello", server.addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(text, "/hello");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn shutdown_drains_in_flight_connections() {
    let server = start_server(test_config(), Slow(Duration::from_millis(200))).await;
    let addr = server.addr;

    let client = tokio::spawn(async move { send_raw(addr, b"GET / HTTP/1.1\r\n\r\n").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.stop().await.unwrap();
    let response = client.await.unwrap();
    assert!(response.ends_with("\r\n\r\ndone"));

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn shutdown_aborts_connections_past_the_deadline() {
    let mut config = test_config();
    config.timeouts.shutdown_secs = 0;
    let server = start_server(config, Slow(Duration::from_secs(30))).await;
    let addr = server.addr;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(5), server.stop())
        .await
        .expect("server did not stop")
        .unwrap();

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    assert!(response.is_empty());
}

#[tokio::test]
async fn concurrent_clients_are_served_independently() {
    let server = start_server(test_config(), Echo).await;
    let addr = server.addr;

    let responses = futures_util::future::join_all((0..16).map(|i| async move {
        let request = format!("GET /client/{i} HTTP/1.1\r\n\r\n");
        (i, send_raw(addr, request.as_bytes()).await)
    }))
    .await;

    for (i, response) in responses {
        let (_, body) = split_response(&response);
        assert_eq!(body, format!("GET /client/{i}\n"));
    }

    server.stop().await.unwrap();
}
