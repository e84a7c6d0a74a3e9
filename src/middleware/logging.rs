//! Request logging middleware.
//!
//! One line per HTTP request with method, path, status and latency.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Log each request once the response is ready.
///
/// `/health` is skipped. Only the presence of a bearer credential is logged,
/// never the token itself.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if path == "/health" {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let bearer = request.headers().contains_key(AUTHORIZATION);

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    match status {
        s if s.is_server_error() => warn!(
            method = %method,
            path = %path,
            status = s.as_u16(),
            latency_ms,
            "Request failed"
        ),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            bearer,
            latency_ms,
            "Access denied"
        ),
        s if s.is_client_error() => debug!(
            method = %method,
            path = %path,
            status = s.as_u16(),
            latency_ms,
            "Request rejected"
        ),
        s => info!(
            method = %method,
            path = %path,
            status = s.as_u16(),
            latency_ms,
            "Request completed"
        ),
    }

    response
}
