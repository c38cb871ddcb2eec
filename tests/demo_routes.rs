//! Demo routes served through the full stack.

mod common;

use common::{decode_chunked, send_raw, split_response, start_mock_backend, start_server, test_config};
use httpfromtcp::routing::router::{BAD_REQUEST_PAGE, OK_PAGE};
use httpfromtcp::routing::DemoRouter;
use httpfromtcp::ServerConfig;
use sha2::{Digest, Sha256};

fn config_with_upstream(base: String) -> ServerConfig {
    let mut config = test_config();
    config.demo.upstream_base_url = base;
    config
}

#[tokio::test]
async fn fixed_pages() {
    let config = test_config();
    let server = start_server(config.clone(), DemoRouter::new(&config).unwrap()).await;

    let response = send_raw(server.addr, b"GET /yourproblem HTTP/1.1\r\nHost: localhost:42069\r\n\r\n").await;
    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert_eq!(body, BAD_REQUEST_PAGE);

    let response = send_raw(server.addr, b"GET / HTTP/1.1\r\nHost: localhost:42069\r\n\r\n").await;
    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains(&format!("Content-Length: {}", OK_PAGE.len())));
    assert_eq!(body, OK_PAGE);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn httpbin_relay_streams_chunks_with_digest_trailers() {
    let payload: Vec<u8> = (0..100u8).map(|i| b'a' + i % 26).collect();
    let upstream = start_mock_backend("application/json", payload.clone()).await;

    let config = config_with_upstream(format!("http://{upstream}"));
    let server = start_server(config.clone(), DemoRouter::new(&config).unwrap()).await;

    let response = send_raw(server.addr, b"GET /httpbin/stream/100 HTTP/1.1\r\nHost: localhost:42069\r\n\r\n").await;
    let (head, body) = split_response(&response);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Type: application/json\r\n"));
    assert!(head.contains("Transfer-Encoding: chunked\r\n"));
    assert!(head.ends_with("Trailer: X-Content-Length, X-Content-SHA256"));
    assert!(!head.contains("Content-Length:"));

    assert!(body.starts_with("20\r\n"), "first chunk should be 32 bytes");
    let (relayed, trailers) = decode_chunked(body.as_bytes());
    assert_eq!(relayed, payload);

    let digest: String = Sha256::digest(&payload)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect();
    assert_eq!(
        trailers,
        [
            "X-Content-Length: 100".to_string(),
            format!("X-Content-Sha256: {digest}"),
        ]
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn unreachable_upstream_renders_500_page() {
    let config = config_with_upstream("http://127.0.0.1:1".to_string());
    let server = start_server(config.clone(), DemoRouter::new(&config).unwrap()).await;

    let response = send_raw(server.addr, b"GET /httpbin/get HTTP/1.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(response.contains("<h1>Internal Server Error</h1>"));

    server.stop().await.unwrap();
}
