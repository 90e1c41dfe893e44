//! Database operations for the Handset `PostgreSQL` store.
//!
//! # Tables
//!
//! - `customers` - Retailer accounts that authenticate against the API
//! - `users` - Sub-accounts, each owned by one customer
//! - `phones` - The shared handset catalog
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p handset-cli -- migrate
//! ```
//!
//! Handlers and services only see the repository traits below, so the
//! `PostgreSQL` implementations can be swapped for the in-memory store
//! (`memory::InMemoryStore`, behind the `test-support` feature) in tests.

pub mod customers;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod phones;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use handset_core::{CustomerId, Email, PhoneId, UserId};

use crate::models::{Customer, NewUser, Pagination, Phone, User};

pub use customers::PgCustomerRepository;
pub use phones::PgPhoneRepository;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into [`Self::Conflict`].
    pub(crate) fn from_write(error: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = error
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(error)
    }

    /// An owned copy for callers that only hold a shared reference.
    ///
    /// `sqlx::Error` is not `Clone`, so driver errors keep their message
    /// but not their original variant.
    #[must_use]
    pub fn replicate(&self) -> Self {
        match self {
            Self::Database(e) => Self::Database(sqlx::Error::Protocol(e.to_string())),
            Self::DataCorruption(msg) => Self::DataCorruption(msg.clone()),
            Self::NotFound => Self::NotFound,
            Self::Conflict(msg) => Self::Conflict(msg.clone()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Lookup of authenticated customer accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find the customer whose login identifier is `email`.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError>;
}

/// Read access to the phone catalog.
#[async_trait]
pub trait PhoneRepository: Send + Sync {
    /// One page of phones ordered by id.
    async fn find_page(&self, page: Pagination) -> Result<Vec<Phone>, RepositoryError>;

    /// A single phone.
    async fn find_by_id(&self, id: PhoneId) -> Result<Option<Phone>, RepositoryError>;
}

/// Persistence of sub-accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// One page of the users owned by `owner`, ordered by id.
    async fn find_page_by_owner(
        &self,
        owner: CustomerId,
        page: Pagination,
    ) -> Result<Vec<User>, RepositoryError>;

    /// A single user regardless of owner.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Insert a new user and return it with its assigned id.
    ///
    /// Returns [`RepositoryError::Conflict`] when the email is taken.
    async fn save(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Delete a user. Returns whether a row was removed.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;
}
