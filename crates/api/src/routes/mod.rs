//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health             - Liveness check (public)
//! GET    /health/ready       - Readiness check (public, wired in the binary)
//!
//! # Catalog (any authenticated customer)
//! GET    /api/phones         - Paginated phone list (?page=1&limit=10)
//! GET    /api/phones/{id}    - Phone detail
//!
//! # Sub-accounts (owner only)
//! GET    /api/users          - Paginated list of the caller's users
//! POST   /api/users          - Create a user owned by the caller
//! GET    /api/users/{id}     - User detail
//! DELETE /api/users/{id}     - Delete a user
//! ```
//!
//! Unknown paths and unsupported methods answer with the JSON error
//! envelope (404 and 405).

pub mod phones;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Request, Response, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Message for paths that match no route.
pub const ROUTE_NOT_FOUND: &str = "Ressource introuvable.";

/// A pre-serialized JSON body, as stored in the list cache.
pub struct JsonPayload(pub Arc<str>);

impl IntoResponse for JsonPayload {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            self.0.to_string(),
        )
            .into_response()
    }
}

/// Create the catalog routes router.
pub fn phone_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(phones::index))
        .route("/{id}", get(phones::show))
        .method_not_allowed_fallback(method_not_allowed)
}

/// Create the sub-account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/{id}", get(users::show).delete(users::destroy))
        .method_not_allowed_fallback(method_not_allowed)
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/phones", phone_routes())
        .nest("/api/users", user_routes())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
}

/// The full application: routes, request tracing and request IDs.
///
/// Sentry layers and the readiness probe are added by the binary.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Unknown paths get the same JSON envelope as every other error.
async fn not_found() -> AppError {
    AppError::NotFound(ROUTE_NOT_FOUND.to_owned())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_json_payload_is_served_verbatim() {
        let response = JsonPayload(Arc::from(r#"[{"id":1}]"#)).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], br#"[{"id":1}]"#);
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_path_gets_json_envelope() {
        let app: Router = Router::new()
            .route("/health", get(health))
            .fallback(not_found);

        let (status, body) = send(app, "GET", "/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], ROUTE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_gets_json_envelope() {
        let app: Router = Router::new()
            .nest(
                "/api",
                Router::new()
                    .route("/items", get(health))
                    .method_not_allowed_fallback(method_not_allowed),
            )
            .fallback(not_found);

        let (status, body) = send(app, "PUT", "/api/items").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["status"], 405);
        assert_eq!(body["message"], "Méthode non autorisée.");
    }

    #[tokio::test]
    async fn test_health_needs_no_state() {
        let app: Router = Router::new().route("/health", get(health));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
