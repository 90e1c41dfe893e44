//! Authentication extractor.
//!
//! Provides an extractor for requiring an authenticated customer in route
//! handlers.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::Customer;
use crate::state::AppState;

/// Extractor that requires a valid bearer token naming a customer.
///
/// Rejects with a 401 JSON error before the handler runs.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireCustomer(customer): RequireCustomer,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireCustomer(pub Customer);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let customer = state.authenticator().resolve(header).await?;
        set_sentry_user(&customer.id, Some(customer.email.as_str()));

        Ok(Self(customer))
    }
}
