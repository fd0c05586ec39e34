//! Cache-first reads over the store and the upstream platform.
//!
//! Every read is spelled out as `read_local` then, on a miss, `fetch_remote`.
//! Point lookups served from upstream also `spawn_repopulate` so the next read
//! hits the store. A store error on a read counts as a miss and is never
//! returned to the caller.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use draftline_core::{ShopifyGid, TagFilter};

use crate::db::{CustomerStore, DraftOrderStore, RepositoryError};
use crate::shopify::{CommerceUpstream, ShopifyError};

use super::QueryError;
use super::views::{CustomerCompanyView, CustomerView, DraftOrderTagsView, DraftOrderView};

/// How many records a list falls back to when the store is empty.
pub const FALLBACK_PAGE_SIZE: i64 = 50;

/// Read a value from the store, treating an error as a miss.
async fn read_local<T>(
    entity: &'static str,
    read: impl Future<Output = Result<T, RepositoryError>>,
) -> Option<T> {
    match read.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(entity, error = %e, "Store read failed, falling back to upstream");
            None
        }
    }
}

/// Call upstream, replacing any failure with a generic message.
async fn fetch_remote<T>(
    message: &'static str,
    fetch: impl Future<Output = Result<T, ShopifyError>>,
) -> Result<T, QueryError> {
    fetch.await.map_err(|e| {
        error!(error = %e, "{message}");
        QueryError::Upstream(message)
    })
}

/// Write an upstream result back to the store without waiting for it.
fn spawn_repopulate<F>(entity: &'static str, external_id: ShopifyGid, write: F)
where
    F: Future<Output = Result<(), RepositoryError>> + Send + 'static,
{
    tokio::spawn(async move {
        match write.await {
            Ok(()) => debug!(entity, external_id = %external_id, "Cache repopulated"),
            Err(e) => {
                warn!(entity, external_id = %external_id, error = %e, "Cache repopulation failed");
            }
        }
    });
}

fn parse_id(
    raw: &str,
    parse: fn(&str) -> Result<ShopifyGid, draftline_core::GidError>,
) -> Result<ShopifyGid, QueryError> {
    parse(raw).map_err(|e| QueryError::InvalidId(e.to_string()))
}

/// Read API over the cache with upstream fallback.
#[derive(Clone)]
pub struct QueryService {
    customers: Arc<dyn CustomerStore>,
    draft_orders: Arc<dyn DraftOrderStore>,
    upstream: Arc<dyn CommerceUpstream>,
}

impl QueryService {
    /// Create a new query service.
    #[must_use]
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        draft_orders: Arc<dyn DraftOrderStore>,
        upstream: Arc<dyn CommerceUpstream>,
    ) -> Self {
        Self {
            customers,
            draft_orders,
            upstream,
        }
    }

    /// All cached customers, or the first upstream page if the cache is empty.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Upstream` if the fallback fetch fails.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerView>, QueryError> {
        if let Some(customers) = read_local("customer", self.customers.find_all()).await
            && !customers.is_empty()
        {
            return Ok(customers.into_iter().map(Into::into).collect());
        }

        let page = fetch_remote(
            "Failed to fetch customers.",
            self.upstream.customers_page(FALLBACK_PAGE_SIZE, None),
        )
        .await?;
        Ok(page.items.into_iter().map(Into::into).collect())
    }

    /// One customer by GID or numeric ID.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidId` for a malformed ID and
    /// `QueryError::Upstream` if the fallback fetch fails.
    #[instrument(skip(self))]
    pub async fn get_customer(&self, id: &str) -> Result<Option<CustomerView>, QueryError> {
        let gid = parse_id(id, ShopifyGid::customer)?;

        if let Some(Some(customer)) =
            read_local("customer", self.customers.find_by_external_id(&gid)).await
        {
            return Ok(Some(customer.into()));
        }

        let Some(record) =
            fetch_remote("Failed to fetch customer.", self.upstream.customer(&gid)).await?
        else {
            return Ok(None);
        };

        let store = Arc::clone(&self.customers);
        let cached = record.clone();
        spawn_repopulate("customer", gid, async move {
            store.upsert_from_upstream(&cached).await.map(|_| ())
        });

        Ok(Some(record.into()))
    }

    /// All cached draft orders, or the first upstream page if the cache is empty.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Upstream` if the fallback fetch fails.
    #[instrument(skip(self))]
    pub async fn list_draft_orders(&self) -> Result<Vec<DraftOrderView>, QueryError> {
        if let Some(drafts) = read_local("draft_order", self.draft_orders.find_all()).await
            && !drafts.is_empty()
        {
            return Ok(drafts.into_iter().map(Into::into).collect());
        }

        let page = fetch_remote(
            "Failed to fetch draft orders.",
            self.upstream.draft_orders_page(FALLBACK_PAGE_SIZE, None),
        )
        .await?;
        Ok(page.items.into_iter().map(Into::into).collect())
    }

    /// One draft order by GID or numeric ID.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidId` for a malformed ID and
    /// `QueryError::Upstream` if the fallback fetch fails.
    #[instrument(skip(self))]
    pub async fn get_draft_order(&self, id: &str) -> Result<Option<DraftOrderView>, QueryError> {
        let gid = parse_id(id, ShopifyGid::draft_order)?;

        if let Some(Some(draft)) =
            read_local("draft_order", self.draft_orders.find_by_external_id(&gid)).await
        {
            return Ok(Some(draft.into()));
        }

        let Some(record) =
            fetch_remote("Failed to fetch draft order.", self.upstream.draft_order(&gid)).await?
        else {
            return Ok(None);
        };

        let store = Arc::clone(&self.draft_orders);
        let cached = record.clone();
        spawn_repopulate("draft_order", gid, async move {
            store.upsert_from_upstream(&cached).await.map(|_| ())
        });

        Ok(Some(record.into()))
    }

    /// Draft orders for one customer, filtered by tags.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidId` for a malformed customer ID and
    /// `QueryError::Upstream` if the fallback fetch fails.
    #[instrument(skip(self))]
    pub async fn draft_orders_for_customer(
        &self,
        customer_id: &str,
        filter: &TagFilter,
    ) -> Result<Vec<DraftOrderView>, QueryError> {
        let gid = parse_id(customer_id, ShopifyGid::customer)?;

        let views: Vec<DraftOrderView> = match read_local(
            "draft_order",
            self.draft_orders.find_by_customer(&gid),
        )
        .await
        {
            Some(drafts) if !drafts.is_empty() => drafts.into_iter().map(Into::into).collect(),
            _ => fetch_remote(
                "Failed to fetch draft orders.",
                self.upstream.draft_orders_page(FALLBACK_PAGE_SIZE, None),
            )
            .await?
            .items
            .into_iter()
            .filter(|d| d.customer_external_id.as_ref() == Some(&gid))
            .map(Into::into)
            .collect(),
        };

        Ok(views
            .into_iter()
            .filter(|view| filter.matches(&view.tags))
            .collect())
    }

    /// Customers with their company and price tier, `N/A` where missing.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Upstream` if the fallback fetch fails.
    pub async fn customers_with_companies(&self) -> Result<Vec<CustomerCompanyView>, QueryError> {
        Ok(self
            .list_customers()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Company name to price tier, from the store.
    #[instrument(skip(self))]
    pub async fn company_price_tiers(&self) -> BTreeMap<String, Option<String>> {
        read_local("company", self.customers.list_companies())
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|company| (company.name, company.price_tier))
            .collect()
    }

    /// Tag a draft order upstream, then refresh the cached row.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidId` or `QueryError::InvalidTag` for bad
    /// input, `QueryError::NotFound` if upstream has no such draft order, and
    /// `QueryError::Upstream` if the write fails.
    #[instrument(skip(self))]
    pub async fn add_draft_order_tag(
        &self,
        id: &str,
        tag: &str,
    ) -> Result<DraftOrderTagsView, QueryError> {
        let gid = parse_id(id, ShopifyGid::draft_order)?;
        let tag = tag.trim();
        if tag.is_empty() || tag.contains(',') {
            return Err(QueryError::InvalidTag(tag.to_string()));
        }

        let tags = match self.upstream.add_draft_order_tag(&gid, tag).await {
            Ok(tags) => tags,
            Err(ShopifyError::NotFound(_)) => return Err(QueryError::NotFound(gid.into_inner())),
            Err(e) => {
                error!(error = %e, "Failed to tag draft order.");
                return Err(QueryError::Upstream("Failed to tag draft order."));
            }
        };

        self.refresh_tagged(&gid, tag).await;

        Ok(DraftOrderTagsView {
            id: gid.into_inner(),
            tags,
        })
    }

    /// Bring the cached row in line with upstream after a tag write.
    ///
    /// Re-reads the draft order and upserts it; if that fails, the tag alone
    /// is added to whatever row is cached.
    async fn refresh_tagged(&self, gid: &ShopifyGid, tag: &str) {
        match self.upstream.draft_order(gid).await {
            Ok(Some(record)) => {
                if let Err(e) = self.draft_orders.upsert_from_upstream(&record).await {
                    warn!(external_id = %gid, error = %e, "Failed to refresh tagged draft order");
                }
                return;
            }
            Ok(None) => warn!(external_id = %gid, "Tagged draft order missing on re-read"),
            Err(e) => warn!(external_id = %gid, error = %e, "Failed to re-read tagged draft order"),
        }

        match self.draft_orders.add_tag(gid, tag).await {
            Ok(_) | Err(RepositoryError::NotFound) => {}
            Err(e) => warn!(external_id = %gid, error = %e, "Failed to add cached tag"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::test_support::{FakeUpstream, customer, draft_order};

    fn service(store: &Arc<MemoryStore>, upstream: FakeUpstream) -> (QueryService, Arc<FakeUpstream>) {
        let upstream = Arc::new(upstream);
        let service = QueryService::new(store.clone(), store.clone(), upstream.clone());
        (service, upstream)
    }

    /// Wait for a spawned repopulation to land.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_get_customer_same_shape_from_store_and_upstream() {
        let store = Arc::new(MemoryStore::new());
        let mut record = customer(7);
        record.company = Some("Acme Supply".to_string());
        record.default_address = Some(crate::models::AddressRecord {
            city: Some("Austin".to_string()),
            country_code: Some("us".to_string()),
            country_name: Some("United States".to_string()),
            ..Default::default()
        });
        let (service, upstream) = service(
            &store,
            FakeUpstream::new().with_customer_pages(vec![vec![record]]),
        );

        let remote = service.get_customer("7").await.unwrap().unwrap();
        settle().await;
        assert_eq!(store.customer_count().await, 1);

        let local = service.get_customer("gid://shopify/Customer/7").await.unwrap().unwrap();
        assert_eq!(remote, local);
        assert_eq!(upstream.point_calls(), 1);
        assert_eq!(local.company.as_deref(), Some("Acme Supply"));
    }

    #[tokio::test]
    async fn test_get_draft_order_same_shape_from_store_and_upstream() {
        let store = Arc::new(MemoryStore::new());
        let (service, upstream) = service(
            &store,
            FakeUpstream::new()
                .with_draft_order_pages(vec![vec![draft_order(5, Some(1), &["rush", "quote"])]]),
        );

        let remote = service.get_draft_order("5").await.unwrap().unwrap();
        settle().await;
        let local = service.get_draft_order("5").await.unwrap().unwrap();

        assert_eq!(remote, local);
        assert_eq!(local.tags, vec!["quote", "rush"]);
        assert_eq!(upstream.point_calls(), 1);
    }

    #[tokio::test]
    async fn test_get_customer_missing_everywhere() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store, FakeUpstream::new());

        assert!(service.get_customer("99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_customer_rejects_malformed_id() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store, FakeUpstream::new());

        let err = service.get_customer("gid://shopify/DraftOrder/1").await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generic() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store, FakeUpstream::failing());

        let err = service.get_customer("1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch customer.");
    }

    #[tokio::test]
    async fn test_list_customers_prefers_store() {
        let store = Arc::new(MemoryStore::new());
        CustomerStore::upsert_from_upstream(store.as_ref(), &customer(1))
            .await
            .unwrap();
        let (service, upstream) = service(&store, FakeUpstream::failing());

        let customers = service.list_customers().await.unwrap();

        assert_eq!(customers.len(), 1);
        assert_eq!(upstream.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_customers_falls_back_when_empty() {
        let store = Arc::new(MemoryStore::new());
        let (service, upstream) = service(
            &store,
            FakeUpstream::new().with_customer_pages(vec![(1..=3).map(customer).collect()]),
        );

        let customers = service.list_customers().await.unwrap();

        assert_eq!(customers.len(), 3);
        assert_eq!(upstream.page_calls(), 1);
        settle().await;
        assert_eq!(store.customer_count().await, 0);
    }

    #[tokio::test]
    async fn test_draft_orders_for_customer_filters_tags() {
        let store = Arc::new(MemoryStore::new());
        CustomerStore::upsert_from_upstream(store.as_ref(), &customer(1))
            .await
            .unwrap();
        for record in [
            draft_order(10, Some(1), &["quote"]),
            draft_order(11, Some(1), &["quote", "archived"]),
            draft_order(12, Some(1), &["sample"]),
            draft_order(13, Some(2), &["quote"]),
        ] {
            DraftOrderStore::upsert_from_upstream(store.as_ref(), &record)
                .await
                .unwrap();
        }
        let (service, _) = service(&store, FakeUpstream::failing());

        let filter = TagFilter::from_params(Some("quote"), Some("archived"));
        let drafts = service.draft_orders_for_customer("1", &filter).await.unwrap();

        let ids: Vec<_> = drafts.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["gid://shopify/DraftOrder/10"]);
    }

    #[tokio::test]
    async fn test_draft_orders_for_customer_upstream_fallback() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(
            &store,
            FakeUpstream::new().with_draft_order_pages(vec![vec![
                draft_order(20, Some(4), &[]),
                draft_order(21, Some(5), &[]),
            ]]),
        );

        let drafts = service
            .draft_orders_for_customer("4", &TagFilter::default())
            .await
            .unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts.first().map(|d| d.id.as_str()), Some("gid://shopify/DraftOrder/20"));
    }

    #[tokio::test]
    async fn test_company_price_tiers() {
        let store = Arc::new(MemoryStore::new());
        let mut record = customer(1);
        record.company = Some("Acme".to_string());
        record.tags = vec!["Tier 3".to_string()];
        CustomerStore::upsert_from_upstream(store.as_ref(), &record)
            .await
            .unwrap();
        let (service, _) = service(&store, FakeUpstream::failing());

        let tiers = service.company_price_tiers().await;

        assert_eq!(tiers.get("Acme"), Some(&Some("Tier 3".to_string())));
    }

    #[tokio::test]
    async fn test_add_draft_order_tag_refreshes_cache() {
        let store = Arc::new(MemoryStore::new());
        let record = draft_order(30, None, &["quote"]);
        DraftOrderStore::upsert_from_upstream(store.as_ref(), &record)
            .await
            .unwrap();
        let (service, _) = service(
            &store,
            FakeUpstream::new().with_draft_order_pages(vec![vec![record]]),
        );

        let tagged = service.add_draft_order_tag("30", " approved ").await.unwrap();
        assert_eq!(tagged.tags, vec!["quote", "approved"]);

        let cached = DraftOrderStore::find_by_external_id(
            store.as_ref(),
            &ShopifyGid::draft_order("30").unwrap(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cached.tag_names(), vec!["approved", "quote"]);
    }

    #[tokio::test]
    async fn test_add_draft_order_tag_rejects_blank_tag() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store, FakeUpstream::new());

        let err = service.add_draft_order_tag("30", "  ").await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidTag(_)));
    }

    #[tokio::test]
    async fn test_add_draft_order_tag_unknown_draft() {
        let store = Arc::new(MemoryStore::new());
        let (service, _) = service(&store, FakeUpstream::new());

        let err = service.add_draft_order_tag("31", "quote").await.unwrap_err();
        assert!(matches!(err, QueryError::NotFound(_)));
    }
}
