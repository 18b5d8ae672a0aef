//! HTTP/2 server implementation

use crate::handlers::{handle_request, SharedState};
use http_body_util::Full;
use hyper::server::conn::http2;
use hyper::service::service_fn;
use hyper::Response;
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

pub struct AuthServer {
    state: SharedState,
}

impl AuthServer {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    pub async fn serve(self, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("authkit server listening on {}", addr);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            debug!("New connection from {}", remote_addr);

            let state = self.state.clone();
            tokio::spawn(async move {
                if let Err(err) = Self::handle_connection(stream, state).await {
                    error!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        state: SharedState,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req| {
            let state = state.clone();
            async move { handle_request(req, state).await }
        });

        if let Err(err) = http2::Builder::new(TokioExecutor::new())
            .serve_connection(io, service)
            .await
        {
            error!("HTTP/2 connection error: {}", err);
        }

        Ok(())
    }
}

/// Simple HTTP response builder
pub fn simple_response(
    status: hyper::StatusCode,
    body: impl Into<String>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("server", "authkit/0.1.0")
        .body(Full::new(bytes::Bytes::from(body.into())))
        .unwrap())
}

/// Bodyless response (204 and friends)
pub fn empty_response(
    status: hyper::StatusCode,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    Ok(Response::builder()
        .status(status)
        .header("server", "authkit/0.1.0")
        .body(Full::new(bytes::Bytes::new()))
        .unwrap())
}
