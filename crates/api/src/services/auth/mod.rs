//! Caller authentication.
//!
//! Every `/api` request carries `Authorization: Bearer <token>`. The token is
//! verified, its `username` claim is read, and the customer with that email
//! becomes the caller for the rest of the request.

mod error;
pub mod password;
pub mod token;

pub use error::{AuthError, EXPIRED_TOKEN, INVALID_TOKEN, NOT_A_CUSTOMER, TOKEN_NOT_FOUND};
pub use password::{Argon2Hasher, CredentialHasher};
pub use token::{Claims, Hs256Verifier, TokenError, TokenVerifier};

use std::sync::Arc;

use tracing::debug;

use handset_core::Email;

use crate::db::AccountStore;
use crate::models::Customer;

/// Claim holding the customer's login email.
pub const USERNAME_CLAIM: &str = "username";

const BEARER_PREFIX: &str = "Bearer ";

/// Resolves bearer tokens to customer accounts.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<dyn TokenVerifier>,
    accounts: Arc<dyn AccountStore>,
}

impl Authenticator {
    /// Create a new authenticator.
    #[must_use]
    pub fn new(verifier: Arc<dyn TokenVerifier>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { verifier, accounts }
    }

    /// Resolve the raw `Authorization` header value to a customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Malformed` if the header is absent or not a bearer
    /// token, `AuthError::InvalidToken` if verification fails,
    /// `AuthError::MissingClaim` if the token has no `username`, and
    /// `AuthError::UnknownAccount` if no customer matches.
    pub async fn resolve(&self, header: Option<&str>) -> Result<Customer, AuthError> {
        let token = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::Malformed)?;

        let claims = self.verifier.decode(token)?;
        let username = claims
            .get(USERNAME_CLAIM)
            .and_then(serde_json::Value::as_str)
            .ok_or(AuthError::MissingClaim(USERNAME_CLAIM))?;

        // A username that is not an email cannot belong to any customer.
        let Ok(email) = Email::parse(username) else {
            debug!(username, "Token username is not an email");
            return Err(AuthError::UnknownAccount);
        };

        let customer = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UnknownAccount)?;

        debug!(customer_id = %customer.id, "Resolved caller");
        Ok(customer)
    }
}
