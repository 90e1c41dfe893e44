//! Bearer token verification.
//!
//! Tokens are compact JWS strings signed with HMAC-SHA256 by the issuing
//! identity service. Only verification lives here; the API never mints
//! tokens.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use thiserror::Error;

/// Decoded token claims.
pub type Claims = Map<String, Value>;

/// The only signing algorithm accepted.
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// Errors that can occur while decoding a token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not three base64url segments of JSON.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The header names an algorithm other than HS256.
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    /// The signature does not match.
    #[error("signature mismatch")]
    BadSignature,

    /// The configured secret cannot key the MAC.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// A claim is present but unusable.
    #[error("invalid claims: {0}")]
    Claims(String),

    /// `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// `nbf` is in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// No `exp` claim.
    #[error("token has no expiry")]
    MissingExpiry,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm
            }
            ErrorKind::MissingRequiredClaim(claim) if claim == "exp" => Self::MissingExpiry,
            ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject => Self::Claims(error.to_string()),
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
                Self::InvalidKey(error.to_string())
            }
            _ => Self::Malformed(error.to_string()),
        }
    }
}

/// Decodes and verifies bearer tokens.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] describing why the token was rejected.
    fn decode(&self, token: &str) -> Result<Claims, TokenError>;
}

/// HMAC-SHA256 verifier with a shared secret.
pub struct Hs256Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for Hs256Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hs256Verifier")
            .field("key", &"[REDACTED]")
            .field("leeway_secs", &self.validation.leeway)
            .finish()
    }
}

impl Hs256Verifier {
    /// Create a verifier. `leeway_secs` widens the `exp`/`nbf` window.
    #[must_use]
    pub fn new(secret: &SecretString, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Tokens carry no audience the API could check
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }
}

impl TokenVerifier for Hs256Verifier {
    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}
