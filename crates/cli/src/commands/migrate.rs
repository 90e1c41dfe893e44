//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! handset-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `HANDSET_DATABASE_URL` - `PostgreSQL` connection string (or `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time.

use secrecy::ExposeSecret;
use sqlx::PgPool;

use super::{CommandError, database_url};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
