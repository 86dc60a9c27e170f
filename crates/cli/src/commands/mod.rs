//! CLI command implementations.

pub mod catalog;
pub mod migrate;
pub mod orders;

use secrecy::SecretString;

/// Environment variable holding the storefront database URL.
pub const DATABASE_URL_VAR: &str = "STOREFRONT_DATABASE_URL";

/// Errors shared by commands that talk to the database.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read the storefront database URL, falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(DATABASE_URL_VAR))
}
