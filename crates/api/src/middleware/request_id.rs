//! Request ID middleware for request tracing and correlation.
//!
//! Reuses the `x-request-id` set by an upstream proxy when it looks sane,
//! otherwise generates a UUID v4. The ID is recorded on the request span,
//! tagged on the Sentry scope, stored in request extensions and echoed in the
//! response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest inbound ID accepted verbatim.
const MAX_INBOUND_LENGTH: usize = 128;

/// The correlation ID of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Pick the inbound ID if usable, otherwise mint one.
fn resolve(inbound: Option<&HeaderValue>) -> String {
    inbound
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_INBOUND_LENGTH
                && id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = resolve(request.headers().get(REQUEST_ID_HEADER));

    // The span is opened by `TraceLayer` with an empty `request_id` field
    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
