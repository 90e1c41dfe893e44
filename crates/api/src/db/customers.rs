//! Customer repository for database operations.

use async_trait::async_trait;
use sqlx::PgPool;

use handset_core::{CustomerId, Email};

use super::{AccountStore, RepositoryError};
use crate::models::Customer;

/// `PostgreSQL`-backed customer lookup.
#[derive(Debug, Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    email: String,
    name: String,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            email,
            name: row.name,
        })
    }
}

impl PgCustomerRepository {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a customer account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, email: &Email, name: &str) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customers (email, name)
            VALUES ($1, $2)
            RETURNING id, email, name
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email already exists"))?;

        Customer::try_from(row)
    }
}

#[async_trait]
impl AccountStore for PgCustomerRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, email, name
            FROM customers
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Customer::try_from).transpose()
    }
}
