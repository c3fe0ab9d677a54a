//! HTTP surface polled by the Studio plugin
//!
//! A small hyper server: `/poll` hands out work, `/response` settles it,
//! plus health, readiness, status, metrics and `/mcp/<tool>` routes.

mod routes;

pub use routes::route;

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{info, warn};

use studio_bridge_protocol::ErrorBody;
use studio_bridge_utils::{Result, StudioError};

use crate::state::SharedState;

/// Largest request body accepted
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Bind the listener, naming the address on failure
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|e| StudioError::Bind {
        addr: addr.to_string(),
        source: e,
    })
}

/// Serve connections until shutdown is broadcast
pub async fn run_http_server(listener: TcpListener, state: Arc<SharedState>) {
    let mut shutdown_rx = state.subscribe_shutdown();

    match listener.local_addr() {
        Ok(addr) => info!("HTTP server listening on http://{} for Studio plugin", addr),
        Err(_) => info!("HTTP server listening for Studio plugin"),
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                let (stream, remote_addr) = match accept_result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("HTTP accept error: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let state_clone = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state_clone);
                        async move { handle_request(req, state).await }
                    });

                    if let Err(e) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        // Plugins drop connections between polls
                        if !e.is_incomplete_message() {
                            warn!("HTTP connection error from {}: {}", remote_addr, e);
                        }
                    }
                });
            }

            _ = shutdown_rx.recv() => {
                info!("HTTP server shutting down");
                break;
            }
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<SharedState>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            return Ok(bad_body());
        }
    };

    Ok(route(&state, &parts.method, parts.uri.path(), body).await)
}

fn bad_body() -> Response<Full<Bytes>> {
    routes::json(StatusCode::BAD_REQUEST, &ErrorBody::new("Unreadable request body"))
}
