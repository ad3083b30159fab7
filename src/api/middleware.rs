//! API Middleware
//!
//! Operation context and request logging middleware.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::OperationContext;

/// Header carrying the request id, set by `SetRequestIdLayer` when absent
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

// =========================================================================
// Request Id Middleware
// =========================================================================

/// Drop a caller-supplied request id that is not a UUID, so the id
/// generated in its place is the one logged and echoed back.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    if request.headers().contains_key(REQUEST_ID_HEADER) && request_id(request.headers()).is_none() {
        tracing::debug!(
            raw = ?request.headers().get(REQUEST_ID_HEADER),
            "Discarding malformed request id"
        );
        request.headers_mut().remove(REQUEST_ID_HEADER);
    }

    next.run(request).await
}

// =========================================================================
// Operation Context Middleware
// =========================================================================

/// Build the `OperationContext` for this request from its request id.
/// Falls back to a fresh correlation id when none is present.
pub async fn context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let mut context = OperationContext::new();
    match request_id(request.headers()) {
        Some(id) => context = context.with_correlation_id(id),
        None => {
            context.ensure_correlation_id();
        }
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

// =========================================================================
// Logging Middleware
// =========================================================================

/// Log every request with its outcome and latency
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let correlation_id = request
        .extensions()
        .get::<OperationContext>()
        .and_then(|ctx| ctx.correlation_id);

    let start = std::time::Instant::now();

    tracing::debug!(
        method = %method,
        uri = %uri,
        correlation_id = ?correlation_id,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis() as u64,
            correlation_id = ?correlation_id,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis() as u64,
            correlation_id = ?correlation_id,
            "Request completed"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_id_parsing() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(request_id(&headers), Some(id));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(request_id(&headers), None);

        assert_eq!(request_id(&HeaderMap::new()), None);
    }
}
