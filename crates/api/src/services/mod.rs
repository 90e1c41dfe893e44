//! Business logic services for the catalog API.
//!
//! # Services
//!
//! - `auth` - Bearer token verification and caller resolution
//! - `access` - Ownership checks on customer-scoped resources
//! - `cache` - Tagged read-through cache for list pages
//! - `phones` - Catalog reads
//! - `users` - Customer-scoped sub-account operations

pub mod access;
pub mod auth;
pub mod cache;
pub mod phones;
pub mod users;

pub use access::{Owned, ensure_owner, is_owner};
pub use auth::{Argon2Hasher, Authenticator, CredentialHasher, Hs256Verifier, TokenVerifier};
pub use cache::{CacheKey, PHONE_LIST_TAG, TaggedCache, USER_LIST_TAG};
pub use phones::PhoneService;
pub use users::UserService;
