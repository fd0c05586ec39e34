//! Integration tests for paginated backfill into Postgres.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use draftline_integration_tests::{PagedUpstream, customer, pool, unique_id};
use draftline_server::db::{CustomerRepository, CustomerStore};
use draftline_server::models::CustomerRecord;
use draftline_server::sync;

fn batch(count: usize) -> Vec<CustomerRecord> {
    (0..count).map(|_| customer(unique_id())).collect()
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_backfill_sixty_plus_forty() {
    let repo = CustomerRepository::new(pool().await);
    let first = batch(60);
    let second = batch(40);
    let upstream = PagedUpstream::new(vec![first.clone(), second.clone()]);

    let report = sync::backfill_customers(&upstream, &repo, 60).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.processed, 100);
    assert_eq!(report.failed, 0);

    for record in first.iter().chain(&second) {
        let stored = repo.find_by_external_id(&record.external_id).await.unwrap();
        assert!(stored.is_some(), "{} missing", record.external_id);
    }
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_backfill_rerun_keeps_rows() {
    let repo = CustomerRepository::new(pool().await);
    let records = batch(5);
    let upstream = PagedUpstream::new(vec![records.clone()]);

    sync::backfill_customers(&upstream, &repo, 10).await.unwrap();
    let before = repo
        .find_by_external_id(&records[0].external_id)
        .await
        .unwrap()
        .unwrap();

    let report = sync::backfill_customers(&upstream, &repo, 10).await.unwrap();
    let after = repo
        .find_by_external_id(&records[0].external_id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.processed, 5);
    assert_eq!(before.id, after.id);
}
