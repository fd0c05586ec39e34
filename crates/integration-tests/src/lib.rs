//! Integration tests for Draftline.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! task db:start
//! cargo run -p draftline-cli -- migrate
//!
//! # Run integration tests (they are #[ignore]d by default)
//! DATABASE_URL=postgres://... cargo test -p draftline-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `repositories` - Postgres repository contracts
//! - `backfill` - Paginated backfill into Postgres
//! - `http` - Requests against a running server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::PgPool;

use draftline_core::ShopifyGid;
use draftline_server::models::{CustomerRecord, DraftOrderRecord, Page};
use draftline_server::shopify::{CommerceUpstream, ShopifyError};

/// Connect to `DATABASE_URL` and apply the cache migrations.
///
/// # Panics
///
/// Panics if `DATABASE_URL` is unset or the database is unreachable.
pub async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = draftline_server::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Base URL of a running server.
#[must_use]
pub fn server_base_url() -> String {
    std::env::var("DRAFTLINE_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A numeric ID no other test run has used.
///
/// # Panics
///
/// Panics if the system clock is before the Unix epoch.
#[must_use]
pub fn unique_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_micros();
    let base = u64::try_from(micros).unwrap_or(u64::MAX).saturating_mul(1000);
    base.saturating_add(COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// A customer record with a name and tier tag.
#[must_use]
pub fn customer(id: u64) -> CustomerRecord {
    let mut record = CustomerRecord::new(ShopifyGid::from_numeric(ShopifyGid::CUSTOMER, id));
    record.first_name = Some(format!("First{id}"));
    record.last_name = Some(format!("Last{id}"));
    record.tags = vec!["Tier 1".to_string()];
    record
}

/// A draft order record carrying `tags`.
#[must_use]
pub fn draft_order(id: u64, tags: &[&str]) -> DraftOrderRecord {
    let mut record = DraftOrderRecord::new(ShopifyGid::from_numeric(ShopifyGid::DRAFT_ORDER, id));
    record.name = Some(format!("#D{id}"));
    record.tags = tags.iter().map(ToString::to_string).collect();
    record
}

/// Upstream serving fixed customer pages.
pub struct PagedUpstream {
    pages: Vec<Vec<CustomerRecord>>,
}

impl PagedUpstream {
    #[must_use]
    pub const fn new(pages: Vec<Vec<CustomerRecord>>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl CommerceUpstream for PagedUpstream {
    async fn customers_page(
        &self,
        _first: i64,
        after: Option<&str>,
    ) -> Result<Page<CustomerRecord>, ShopifyError> {
        let index = after.and_then(|c| c.parse::<usize>().ok()).map_or(0, |n| n + 1);
        Ok(Page {
            items: self.pages.get(index).cloned().unwrap_or_default(),
            has_next_page: index + 1 < self.pages.len(),
            end_cursor: Some(index.to_string()),
        })
    }

    async fn customer(&self, _id: &ShopifyGid) -> Result<Option<CustomerRecord>, ShopifyError> {
        Ok(None)
    }

    async fn draft_orders_page(
        &self,
        _first: i64,
        _after: Option<&str>,
    ) -> Result<Page<DraftOrderRecord>, ShopifyError> {
        Ok(Page::last(Vec::new()))
    }

    async fn draft_order(
        &self,
        _id: &ShopifyGid,
    ) -> Result<Option<DraftOrderRecord>, ShopifyError> {
        Ok(None)
    }

    async fn add_draft_order_tag(
        &self,
        id: &ShopifyGid,
        _tag: &str,
    ) -> Result<Vec<String>, ShopifyError> {
        Err(ShopifyError::NotFound(id.to_string()))
    }
}
