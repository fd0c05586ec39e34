//! Entity Store: the local relational mirror of upstream data.
//!
//! # Database schema: `draftline`
//!
//! ## Tables
//!
//! - `customers` - Cached customers, unique on `external_id`
//! - `companies` - Companies, unique on `name`
//! - `addresses` - Default and shipping addresses
//! - `countries` - Countries, unique on `code`
//! - `draft_orders` - Cached draft orders, unique on `external_id`
//! - `draft_order_tags` - Draft order tags, unique on `(draft_order_id, tag)`
//!
//! The store is strictly a mirror: every row is written by an upsert keyed on
//! the upstream identifier and superseded in place on the next sync.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p draftline-cli -- migrate
//! ```
//!
//! # Backends
//!
//! [`CustomerRepository`] and [`DraftOrderRepository`] implement the store
//! traits on `PostgreSQL`. [`MemoryStore`] implements the same contract in
//! process memory; it backs the server when no `DATABASE_URL` is configured.

mod addresses;
pub mod customers;
pub mod draft_orders;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use draftline_core::ShopifyGid;

use crate::models::{Company, Customer, CustomerRecord, DraftOrder, DraftOrderRecord};

pub use customers::CustomerRepository;
pub use draft_orders::DraftOrderRepository;
pub use memory::MemoryStore;

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

    /// Constraint violation (e.g., duplicate unique key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Read/write access to cached customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// All cached customers with company and default address loaded.
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError>;

    /// Point lookup by upstream GID.
    async fn find_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// Insert or update the customer keyed on `record.external_id`.
    ///
    /// Overwrites mutable fields, never identity fields, and advances
    /// `last_synced_at`. Applying the same record twice leaves one row.
    async fn upsert_from_upstream(&self, record: &CustomerRecord)
    -> Result<Customer, RepositoryError>;

    /// All cached companies, ordered by name.
    async fn list_companies(&self) -> Result<Vec<Company>, RepositoryError>;
}

/// Read/write access to cached draft orders.
#[async_trait]
pub trait DraftOrderStore: Send + Sync {
    /// All cached draft orders with customer, shipping address and tags loaded,
    /// newest first.
    async fn find_all(&self) -> Result<Vec<DraftOrder>, RepositoryError>;

    /// Point lookup by upstream GID.
    async fn find_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<Option<DraftOrder>, RepositoryError>;

    /// Draft orders belonging to a customer, newest first.
    async fn find_by_customer(
        &self,
        customer_external_id: &ShopifyGid,
    ) -> Result<Vec<DraftOrder>, RepositoryError>;

    /// Insert or update the draft order keyed on `record.external_id`,
    /// replacing its tag set.
    async fn upsert_from_upstream(
        &self,
        record: &DraftOrderRecord,
    ) -> Result<DraftOrder, RepositoryError>;

    /// Attach a single tag. Returns `false` if the draft already carried it.
    ///
    /// Returns `RepositoryError::NotFound` if the draft order is not cached.
    async fn add_tag(&self, external_id: &ShopifyGid, tag: &str) -> Result<bool, RepositoryError>;

    /// Remove a cached draft order (tags cascade). Returns `true` if a row was removed.
    async fn delete_by_external_id(&self, external_id: &ShopifyGid)
    -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
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

/// Parse a GID read back from the database.
fn stored_gid(raw: &str) -> Result<ShopifyGid, RepositoryError> {
    ShopifyGid::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid gid in database: {e}")))
}
