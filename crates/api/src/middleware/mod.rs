//! HTTP middleware for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (fills the span field, echoes the header)
//!
//! Authentication is an extractor rather than a layer so that `/health`
//! stays public.

pub mod auth;
pub mod request_id;

pub use auth::RequireCustomer;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
