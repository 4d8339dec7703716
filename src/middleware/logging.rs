//! Request logging middleware.
//!
//! Logs every HTTP request with method, path, status code, and latency.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{info, warn, Instrument};

const QUIET_PATHS: &[&str] = &["/health"];

/// Middleware that logs HTTP requests with timing information.
///
/// INFO for completed requests, WARN for server errors. Health probes are
/// passed through untouched.
pub async fn request_logging(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if QUIET_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        client_ip = %addr.ip(),
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;

    let _guard = span.enter();
    log_completion(&method, &path, response.status(), start.elapsed());

    response
}

fn log_completion(method: &Method, path: &str, status: StatusCode, latency: Duration) {
    let latency_ms = latency.as_millis() as u64;
    if status.is_server_error() {
        warn!(
            method = %method,
            path,
            status = status.as_u16(),
            latency_ms,
            "Request failed (5xx)"
        );
    } else if status.is_client_error() {
        info!(
            method = %method,
            path,
            status = status.as_u16(),
            latency_ms,
            "Request completed (4xx)"
        );
    } else {
        info!(
            method = %method,
            path,
            status = status.as_u16(),
            latency_ms,
            "Request completed"
        );
    }
}
