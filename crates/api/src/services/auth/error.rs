//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use super::token::TokenError;
use crate::db::RepositoryError;

/// Message returned when no bearer token was presented.
pub const TOKEN_NOT_FOUND: &str = "JWT Token not found";
/// Message returned when the token fails verification.
pub const INVALID_TOKEN: &str = "Invalid JWT Token";
/// Message returned when the token is past its expiry.
pub const EXPIRED_TOKEN: &str = "Expired JWT Token";
/// Message returned when the token names no customer account.
pub const NOT_A_CUSTOMER: &str =
    "Vous devez être authentifié en tant que Client pour accéder à cette ressource.";

/// Errors that can occur while resolving the calling customer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header, or an empty token.
    #[error("missing bearer token")]
    Malformed,

    /// The token failed decoding or verification.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    /// A required claim is absent from an otherwise valid token.
    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),

    /// The token is valid but does not identify a customer.
    #[error("no customer account for token subject")]
    UnknownAccount,

    /// Repository/database error during account lookup.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// An owned copy of this error.
    #[must_use]
    pub fn replicate(&self) -> Self {
        match self {
            Self::Malformed => Self::Malformed,
            Self::InvalidToken(e) => Self::InvalidToken(e.clone()),
            Self::MissingClaim(claim) => Self::MissingClaim(claim),
            Self::UnknownAccount => Self::UnknownAccount,
            Self::Repository(e) => Self::Repository(e.replicate()),
            Self::PasswordHash => Self::PasswordHash,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Malformed | Self::InvalidToken(_) | Self::MissingClaim(_) | Self::UnknownAccount => {
                StatusCode::UNAUTHORIZED
            }
            Self::Repository(_) | Self::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to API clients.
    #[must_use]
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::Malformed => TOKEN_NOT_FOUND,
            Self::InvalidToken(TokenError::Expired) => EXPIRED_TOKEN,
            Self::InvalidToken(_) | Self::MissingClaim(_) => INVALID_TOKEN,
            Self::UnknownAccount => NOT_A_CUSTOMER,
            Self::Repository(_) | Self::PasswordHash => "Internal server error",
        }
    }
}
