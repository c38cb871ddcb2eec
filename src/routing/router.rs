//! Demo request dispatch.
//!
//! Serves three canned HTML pages and relays `/httpbin` to the configured
//! upstream. Fixed pages carry `Content-Type: text/html` and an exact
//! `Content-Length`.

use tokio::io::AsyncWrite;

use crate::config::ServerConfig;
use crate::http::{Handler, HandlerError, Headers, Request, ResponseWriter, StatusCode};
use crate::routing::matcher::Route;
use crate::routing::proxy::UpstreamProxy;

pub const OK_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>";

pub const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>";

pub const INTERNAL_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>";

/// Handler for the demo binary.
#[derive(Debug, Clone)]
pub struct DemoRouter {
    proxy: UpstreamProxy,
}

impl DemoRouter {
    pub fn new(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            proxy: UpstreamProxy::new(&config.demo, config.timeouts.upstream())?,
        })
    }
}

impl Handler for DemoRouter {
    async fn handle<W>(&self, writer: &mut ResponseWriter<W>, request: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let route = Route::resolve(request.target());
        tracing::debug!(route = route.name(), "Route resolved");

        match route {
            Route::YourProblem => write_html(writer, StatusCode::BAD_REQUEST, BAD_REQUEST_PAGE).await,
            Route::MyProblem => {
                write_html(writer, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_PAGE).await
            }
            Route::Index => write_html(writer, StatusCode::OK, OK_PAGE).await,
            Route::Httpbin { rest } => match self.proxy.relay(writer, rest).await {
                Ok(()) => Ok(()),
                Err(e) if !writer.has_started() => {
                    tracing::warn!(error = %e, "Upstream unavailable");
                    write_html(writer, StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_PAGE).await
                }
                Err(e) => Err(HandlerError::internal(e.to_string())),
            },
        }
    }
}

async fn write_html<W>(writer: &mut ResponseWriter<W>, status: StatusCode, page: &str) -> Result<(), HandlerError>
where
    W: AsyncWrite + Unpin,
{
    let mut headers = Headers::new();
    headers.set("Content-Type", "text/html")?;
    headers.set("Content-Length", &page.len().to_string())?;

    writer.write_status_line(status).await?;
    writer.write_headers(&headers).await?;
    writer.write_body(page.as_bytes()).await?;
    Ok(())
}
