//! Customer account management.
//!
//! # Usage
//!
//! ```bash
//! handset-cli customer create -e shop@retailer.example -n "Retailer"
//! ```
//!
//! The email must match the `username` claim of the tokens the customer
//! will present.

use handset_api::db::PgCustomerRepository;
use handset_core::{CustomerId, Email};
use secrecy::ExposeSecret;
use sqlx::PgPool;

use super::{CommandError, database_url};

/// Register a new customer and return its id.
pub async fn create(email: &str, name: &str) -> Result<CustomerId, CommandError> {
    let email = Email::parse(email)?;
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let customer = PgCustomerRepository::new(pool).create(&email, name).await?;

    tracing::info!(
        "Customer created successfully! ID: {}, Email: {}",
        customer.id,
        customer.email
    );

    Ok(customer.id)
}
