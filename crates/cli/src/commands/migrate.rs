//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! draftline migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string for the cache
//!
//! # Migration Files
//!
//! Cache migrations live in `crates/server/migrations/`.

use secrecy::SecretString;

/// Errors from the migration command.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Read `DATABASE_URL`, loading `.env` first.
pub fn database_url() -> Result<SecretString, MigrationError> {
    let _ = dotenvy::dotenv();

    std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("DATABASE_URL"))
}

/// Run cache database migrations.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to cache database...");
    let pool = draftline_server::db::create_pool(&database_url).await?;

    tracing::info!("Running cache migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Cache migrations complete!");
    Ok(())
}
