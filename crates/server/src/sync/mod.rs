//! Backfill: full paginated re-sync of an entity family into the store.
//!
//! Pages are fetched one at a time and each record is upserted before the
//! next page is requested. A record that fails to upsert is logged and
//! counted; a page that fails to fetch aborts the run. Rows that disappeared
//! upstream are left in place.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::db::{CustomerStore, DraftOrderStore, RepositoryError};
use crate::models::{CustomerRecord, DraftOrderRecord, Page};
use crate::shopify::{CommerceUpstream, ShopifyError};

/// Default page size for backfills.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Largest page the Admin API accepts on a connection.
pub const MAX_PAGE_SIZE: i64 = 250;

/// Errors that abort a backfill.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching a page failed.
    #[error("upstream page fetch failed: {0}")]
    Upstream(#[from] ShopifyError),
}

/// Outcome of a backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Pages fetched.
    pub pages: usize,
    /// Records seen across all pages.
    pub processed: usize,
    /// Records that failed to upsert.
    pub failed: usize,
}

/// Clamp a requested page size into the range the Admin API accepts.
#[must_use]
pub fn clamp_page_size(page_size: i64) -> i64 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Walk every page of a connection, upserting each record.
async fn backfill<T, Fetch, FetchFut, Upsert, UpsertFut>(
    entity: &'static str,
    page_size: i64,
    mut fetch: Fetch,
    mut upsert: Upsert,
) -> Result<SyncReport, SyncError>
where
    Fetch: FnMut(i64, Option<String>) -> FetchFut,
    FetchFut: Future<Output = Result<Page<T>, ShopifyError>>,
    Upsert: FnMut(T) -> UpsertFut,
    UpsertFut: Future<Output = (String, Result<(), RepositoryError>)>,
{
    let first = clamp_page_size(page_size);
    let mut report = SyncReport::default();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch(first, cursor.take()).await?;
        report.pages += 1;
        report.processed += page.items.len();

        for item in page.items {
            let (external_id, result) = upsert(item).await;
            if let Err(e) = result {
                report.failed += 1;
                warn!(entity, external_id = %external_id, error = %e, "Failed to upsert record");
            }
        }

        if !page.has_next_page {
            break;
        }

        match page.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                warn!(
                    entity,
                    pages = report.pages,
                    "Page has a successor but no end cursor; stopping"
                );
                break;
            }
        }
    }

    info!(
        entity,
        pages = report.pages,
        processed = report.processed,
        failed = report.failed,
        "Backfill complete"
    );

    Ok(report)
}

/// Re-sync every customer from upstream into the store.
///
/// # Errors
///
/// Returns `SyncError::Upstream` if a page cannot be fetched. Records already
/// upserted by then stay in the store.
#[instrument(skip(upstream, store))]
pub async fn backfill_customers(
    upstream: &dyn CommerceUpstream,
    store: &dyn CustomerStore,
    page_size: i64,
) -> Result<SyncReport, SyncError> {
    backfill(
        "customer",
        page_size,
        |first, after| async move { upstream.customers_page(first, after.as_deref()).await },
        |record: CustomerRecord| async move {
            let result = store.upsert_from_upstream(&record).await.map(|_| ());
            (record.external_id.into_inner(), result)
        },
    )
    .await
}

/// Re-sync every draft order from upstream into the store.
///
/// Customers should be synced first so draft orders link to cached customers.
///
/// # Errors
///
/// Returns `SyncError::Upstream` if a page cannot be fetched.
#[instrument(skip(upstream, store))]
pub async fn backfill_draft_orders(
    upstream: &dyn CommerceUpstream,
    store: &dyn DraftOrderStore,
    page_size: i64,
) -> Result<SyncReport, SyncError> {
    backfill(
        "draft_order",
        page_size,
        |first, after| async move { upstream.draft_orders_page(first, after.as_deref()).await },
        |record: DraftOrderRecord| async move {
            let result = store.upsert_from_upstream(&record).await.map(|_| ());
            (record.external_id.into_inner(), result)
        },
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::test_support::{FakeUpstream, customer, draft_order};

    #[test]
    fn test_clamp_page_size() {
        assert_eq!(clamp_page_size(0), 1);
        assert_eq!(clamp_page_size(-5), 1);
        assert_eq!(clamp_page_size(100), 100);
        assert_eq!(clamp_page_size(1000), MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_backfill_sixty_plus_forty_customers() {
        let first: Vec<_> = (1..=60).map(customer).collect();
        let second: Vec<_> = (61..=100).map(customer).collect();
        let upstream = FakeUpstream::new().with_customer_pages(vec![first, second]);
        let store = MemoryStore::new();

        let report = backfill_customers(&upstream, &store, 60).await.unwrap();

        assert_eq!(
            report,
            SyncReport {
                pages: 2,
                processed: 100,
                failed: 0
            }
        );
        assert_eq!(store.customer_count().await, 100);
    }

    #[tokio::test]
    async fn test_backfill_fetches_each_page_once() {
        let pages: Vec<Vec<_>> = (0..4)
            .map(|p| (1..=3).map(|i| draft_order(p * 10 + i, None, &[])).collect())
            .collect();
        let upstream = FakeUpstream::new().with_draft_order_pages(pages);
        let store = MemoryStore::new();

        let report = backfill_draft_orders(&upstream, &store, 3).await.unwrap();

        assert_eq!(upstream.page_calls(), 4);
        assert_eq!(report.pages, 4);
        assert_eq!(report.processed, 12);
        assert_eq!(store.draft_order_count().await, 12);
    }

    #[tokio::test]
    async fn test_backfill_is_idempotent() {
        let upstream =
            FakeUpstream::new().with_customer_pages(vec![(1..=5).map(customer).collect()]);
        let store = MemoryStore::new();

        backfill_customers(&upstream, &store, 50).await.unwrap();
        backfill_customers(&upstream, &store, 50).await.unwrap();

        assert_eq!(store.customer_count().await, 5);
    }

    #[tokio::test]
    async fn test_backfill_empty_upstream() {
        let upstream = FakeUpstream::new();
        let store = MemoryStore::new();

        let report = backfill_customers(&upstream, &store, 50).await.unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.processed, 0);
    }

    #[tokio::test]
    async fn test_backfill_page_failure_aborts() {
        let upstream = FakeUpstream::failing();
        let store = MemoryStore::new();

        let result = backfill_customers(&upstream, &store, 50).await;

        assert!(matches!(result, Err(SyncError::Upstream(_))));
        assert_eq!(upstream.page_calls(), 1);
    }

    #[tokio::test]
    async fn test_backfill_stops_without_cursor() {
        let mut calls = 0;
        let report = backfill(
            "customer",
            10,
            |_, _| {
                calls += 1;
                async {
                    Ok(Page {
                        items: vec![customer(1)],
                        has_next_page: true,
                        end_cursor: None,
                    })
                }
            },
            |record: CustomerRecord| async move { (record.external_id.into_inner(), Ok(())) },
        )
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(report.pages, 1);
    }

    #[tokio::test]
    async fn test_backfill_counts_failed_records() {
        let report = backfill(
            "customer",
            10,
            |_, _| async { Ok(Page::last(vec![customer(1), customer(2)])) },
            |record: CustomerRecord| async move {
                (
                    record.external_id.into_inner(),
                    Err(RepositoryError::Conflict("duplicate".to_string())),
                )
            },
        )
        .await
        .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 2);
    }
}
