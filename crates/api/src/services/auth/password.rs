//! Credential hashing for sub-accounts.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

use super::AuthError;

/// Turns a plaintext password into a storable hash.
pub trait CredentialHasher: Send + Sync {
    /// Hash `password` with a fresh salt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    fn hash(&self, password: &SecretString) -> Result<String, AuthError>;

    /// Check `password` against a stored hash.
    fn verify(&self, password: &SecretString, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &SecretString) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    }

    fn verify(&self, password: &SecretString, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_and_verifiable() {
        let password = SecretString::from("correct horse battery staple".to_owned());
        let first = Argon2Hasher.hash(&password).unwrap();
        let second = Argon2Hasher.hash(&password).unwrap();

        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
        assert!(Argon2Hasher.verify(&password, &first));
        assert!(!Argon2Hasher.verify(&SecretString::from("wrong".to_owned()), &first));
    }

    #[test]
    fn test_garbage_hash_does_not_verify() {
        let password = SecretString::from("anything".to_owned());
        assert!(!Argon2Hasher.verify(&password, "not-a-phc-string"));
    }
}
