//! Backfill commands.
//!
//! Walks every page of customers or draft orders on the Admin API and upserts
//! each record into the Postgres cache. The report is logged and printed to
//! stdout as JSON.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string for the cache
//! - `SHOPIFY_STORE`, `SHOPIFY_ACCESS_TOKEN`, `SHOPIFY_WEBHOOK_SECRET`
//! - `SYNC_PAGE_SIZE` - default page size (overridden by `--page-size`)

use draftline_server::config::{BffConfig, ConfigError};
use draftline_server::db::{self, CustomerRepository, DraftOrderRepository};
use draftline_server::shopify::AdminClient;
use draftline_server::sync::{self, SyncError, SyncReport};

use super::migrate::{MigrationError, database_url};

/// Errors from the sync commands.
#[derive(Debug, thiserror::Error)]
pub enum SyncCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] MigrationError),

    #[error("Database error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Everything a backfill run needs.
pub struct SyncContext {
    client: AdminClient,
    customers: CustomerRepository,
    draft_orders: DraftOrderRepository,
    page_size: i64,
}

impl SyncContext {
    /// Load configuration and connect to the cache database.
    pub async fn from_env(page_size: Option<i64>) -> Result<Self, SyncCommandError> {
        let config = BffConfig::from_env()?;
        let database_url = match config.database_url {
            Some(url) => url,
            None => database_url()?,
        };

        let pool = db::create_pool(&database_url).await?;
        tracing::info!("Connected to cache database");

        Ok(Self {
            client: AdminClient::new(&config.shopify),
            customers: CustomerRepository::new(pool.clone()),
            draft_orders: DraftOrderRepository::new(pool),
            page_size: page_size.unwrap_or(config.sync_page_size),
        })
    }

    /// Backfill customers.
    pub async fn customers(&self) -> Result<(), SyncCommandError> {
        let report = sync::backfill_customers(&self.client, &self.customers, self.page_size).await?;
        print_report("customers", report)
    }

    /// Backfill draft orders.
    pub async fn draft_orders(&self) -> Result<(), SyncCommandError> {
        let report =
            sync::backfill_draft_orders(&self.client, &self.draft_orders, self.page_size).await?;
        print_report("draft_orders", report)
    }
}

fn print_report(entity: &str, report: SyncReport) -> Result<(), SyncCommandError> {
    let json = serde_json::to_string(&serde_json::json!({ "entity": entity, "report": report }))?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}
