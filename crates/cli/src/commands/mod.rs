//! CLI subcommand implementations.

pub mod customer;
pub mod migrate;

use secrecy::SecretString;

/// Errors shared by commands that talk to the database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] handset_core::EmailError),

    /// Repository rejected the write.
    #[error("{0}")]
    Repository(#[from] handset_api::db::RepositoryError),
}

/// Database URL from `HANDSET_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("HANDSET_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("HANDSET_DATABASE_URL"))
}
