//! In-process implementation of the store traits.
//!
//! Mirrors the `PostgreSQL` repositories' upsert and ordering semantics so the
//! server can run without a database and handlers can be tested in isolation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use draftline_core::{
    AddressId, CompanyId, CountryId, CustomerId, DraftOrderId, DraftOrderTagId, LineItemSnapshot,
    ShippingLineSnapshot, ShopifyGid,
};

use super::{CustomerStore, DraftOrderStore, RepositoryError};
use crate::models::{
    Address, AddressRecord, Company, Country, Customer, CustomerRecord, CustomerSummary,
    DraftOrder, DraftOrderRecord, DraftOrderTag,
};

#[derive(Debug, Clone)]
struct StoredCustomer {
    id: CustomerId,
    record: CustomerRecord,
    company: Option<String>,
    default_address: Option<Address>,
    price_tier: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_synced_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredDraftOrder {
    id: DraftOrderId,
    name: Option<String>,
    note: Option<String>,
    customer_id: Option<CustomerId>,
    customer_external_id: Option<ShopifyGid>,
    shipping_address: Option<Address>,
    shipping_line: Option<ShippingLineSnapshot>,
    line_items: Vec<LineItemSnapshot>,
    status: Option<String>,
    invoice_url: Option<String>,
    tags: Vec<DraftOrderTag>,
    upstream_created_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_synced_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    countries: BTreeMap<String, Country>,
    companies: BTreeMap<String, Company>,
    customers: BTreeMap<ShopifyGid, StoredCustomer>,
    draft_orders: BTreeMap<ShopifyGid, StoredDraftOrder>,
}

impl Tables {
    fn upsert_country(&mut self, record: &AddressRecord) -> Option<Country> {
        let (code, name) = record.country_parts()?;
        let country = self
            .countries
            .entry(code.clone())
            .or_insert_with(|| Country {
                id: CountryId::generate(),
                name: name.clone().unwrap_or_else(|| code.clone()),
                code,
            });
        if let Some(name) = name {
            country.name = name;
        }
        Some(country.clone())
    }

    /// An address with its country read from the shared country table.
    fn address(&self, stored: Option<&Address>) -> Option<Address> {
        let mut address = stored?.clone();
        address.country = address
            .country
            .and_then(|c| self.countries.get(&c.code).cloned());
        Some(address)
    }

    fn upsert_address(&mut self, existing: Option<&Address>, record: &AddressRecord) -> Address {
        Address {
            id: existing.map_or_else(AddressId::generate, |a| a.id),
            address1: record.address1.clone(),
            address2: record.address2.clone(),
            city: record.city.clone(),
            province: record.province.clone(),
            zip: record.zip.clone(),
            country: self.upsert_country(record),
        }
    }

    fn upsert_company(&mut self, name: &str, price_tier: Option<&str>) {
        let company = self
            .companies
            .entry(name.to_string())
            .or_insert_with(|| Company {
                id: CompanyId::generate(),
                name: name.to_string(),
                price_tier: None,
            });
        if let Some(tier) = price_tier {
            company.price_tier = Some(tier.to_string());
        }
    }

    fn customer(&self, stored: &StoredCustomer) -> Customer {
        Customer {
            id: stored.id,
            external_id: stored.record.external_id.clone(),
            first_name: stored.record.first_name.clone(),
            last_name: stored.record.last_name.clone(),
            email: stored.record.email.clone(),
            company: stored
                .company
                .as_ref()
                .and_then(|name| self.companies.get(name))
                .cloned(),
            default_address: self.address(stored.default_address.as_ref()),
            price_tier: stored.price_tier.clone(),
            tags: stored.record.tags.clone(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            last_synced_at: Some(stored.last_synced_at),
        }
    }

    fn draft_order(&self, external_id: &ShopifyGid, stored: &StoredDraftOrder) -> DraftOrder {
        let customer = stored.customer_id.and_then(|id| {
            self.customers
                .values()
                .find(|c| c.id == id)
                .map(|c| CustomerSummary {
                    id: c.id,
                    external_id: c.record.external_id.clone(),
                    first_name: c.record.first_name.clone(),
                    last_name: c.record.last_name.clone(),
                    email: c.record.email.clone(),
                })
        });

        DraftOrder {
            id: stored.id,
            external_id: external_id.clone(),
            name: stored.name.clone(),
            note: stored.note.clone(),
            customer,
            customer_external_id: stored.customer_external_id.clone(),
            shipping_address: self.address(stored.shipping_address.as_ref()),
            shipping_line: stored.shipping_line.clone(),
            line_items: stored.line_items.clone(),
            status: stored.status.clone(),
            invoice_url: stored.invoice_url.clone(),
            tags: stored.tags.clone(),
            upstream_created_at: stored.upstream_created_at,
            completed_at: stored.completed_at,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            last_synced_at: Some(stored.last_synced_at),
        }
    }
}

/// Ascending order with missing values last.
fn nulls_last(a: Option<&str>, b: Option<&str>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Newest first: upstream creation time (missing last), then cache insertion.
fn newest_first(a: &DraftOrder, b: &DraftOrder) -> std::cmp::Ordering {
    match (a.upstream_created_at, b.upstream_created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
    .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached customers.
    pub async fn customer_count(&self) -> usize {
        self.tables.read().await.customers.len()
    }

    /// Number of cached draft orders.
    pub async fn draft_order_count(&self) -> usize {
        self.tables.read().await.draft_orders.len()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut stored: Vec<&StoredCustomer> = tables.customers.values().collect();
        stored.sort_by(|a, b| {
            nulls_last(a.record.last_name.as_deref(), b.record.last_name.as_deref())
                .then_with(|| {
                    nulls_last(a.record.first_name.as_deref(), b.record.first_name.as_deref())
                })
                .then_with(|| a.record.external_id.cmp(&b.record.external_id))
        });
        Ok(stored.into_iter().map(|c| tables.customer(c)).collect())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(external_id).map(|c| tables.customer(c)))
    }

    async fn upsert_from_upstream(
        &self,
        record: &CustomerRecord,
    ) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let price_tier = record.price_tier();

        let company = record.company_name().map(|name| {
            tables.upsert_company(name, price_tier.as_deref());
            name.to_string()
        });

        let existing = tables.customers.get(&record.external_id).cloned();
        let default_address = record.default_address.as_ref().map(|address| {
            let current = existing.as_ref().and_then(|c| c.default_address.as_ref());
            tables.upsert_address(current, address)
        });

        let stored = StoredCustomer {
            id: existing.as_ref().map_or_else(CustomerId::generate, |c| c.id),
            record: record.clone(),
            company,
            default_address,
            price_tier,
            created_at: existing.as_ref().map_or(now, |c| c.created_at),
            updated_at: now,
            last_synced_at: now,
        };

        let customer = tables.customer(&stored);
        tables.customers.insert(record.external_id.clone(), stored);
        Ok(customer)
    }

    async fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        Ok(self.tables.read().await.companies.values().cloned().collect())
    }
}

#[async_trait]
impl DraftOrderStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<DraftOrder>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut drafts: Vec<DraftOrder> = tables
            .draft_orders
            .iter()
            .map(|(gid, d)| tables.draft_order(gid, d))
            .collect();
        drafts.sort_by(newest_first);
        Ok(drafts)
    }

    async fn find_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<Option<DraftOrder>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .draft_orders
            .get(external_id)
            .map(|d| tables.draft_order(external_id, d)))
    }

    async fn find_by_customer(
        &self,
        customer_external_id: &ShopifyGid,
    ) -> Result<Vec<DraftOrder>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut drafts: Vec<DraftOrder> = tables
            .draft_orders
            .iter()
            .filter(|(_, d)| d.customer_external_id.as_ref() == Some(customer_external_id))
            .map(|(gid, d)| tables.draft_order(gid, d))
            .collect();
        drafts.sort_by(newest_first);
        Ok(drafts)
    }

    async fn upsert_from_upstream(
        &self,
        record: &DraftOrderRecord,
    ) -> Result<DraftOrder, RepositoryError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let customer_id = record
            .customer_external_id
            .as_ref()
            .and_then(|gid| tables.customers.get(gid))
            .map(|c| c.id);

        let existing = tables.draft_orders.get(&record.external_id).cloned();
        let shipping_address = record.shipping_address.as_ref().map(|address| {
            let current = existing.as_ref().and_then(|d| d.shipping_address.as_ref());
            tables.upsert_address(current, address)
        });

        // Keep rows for tags that survive so their IDs stay stable.
        let previous = existing.as_ref().map(|d| d.tags.as_slice()).unwrap_or_default();
        let mut tags: Vec<DraftOrderTag> = Vec::new();
        for tag in &record.tags {
            if tags.iter().any(|t| &t.tag == tag) {
                continue;
            }
            let row = previous
                .iter()
                .find(|t| &t.tag == tag)
                .cloned()
                .unwrap_or_else(|| DraftOrderTag {
                    id: DraftOrderTagId::generate(),
                    tag: tag.clone(),
                    created_at: now,
                });
            tags.push(row);
        }
        tags.sort_by(|a, b| a.tag.cmp(&b.tag));

        let stored = StoredDraftOrder {
            id: existing.as_ref().map_or_else(DraftOrderId::generate, |d| d.id),
            name: record.name.clone(),
            note: record.note.clone(),
            customer_id,
            customer_external_id: record.customer_external_id.clone(),
            shipping_address,
            shipping_line: record.shipping_line.clone(),
            line_items: record.line_items.clone(),
            status: record.status.clone(),
            invoice_url: record.invoice_url.clone(),
            tags,
            upstream_created_at: record.created_at,
            completed_at: record.completed_at,
            created_at: existing.as_ref().map_or(now, |d| d.created_at),
            updated_at: now,
            last_synced_at: now,
        };

        let draft = tables.draft_order(&record.external_id, &stored);
        tables.draft_orders.insert(record.external_id.clone(), stored);
        Ok(draft)
    }

    async fn add_tag(&self, external_id: &ShopifyGid, tag: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let draft = tables
            .draft_orders
            .get_mut(external_id)
            .ok_or(RepositoryError::NotFound)?;

        if draft.tags.iter().any(|t| t.tag == tag) {
            return Ok(false);
        }

        draft.tags.push(DraftOrderTag {
            id: DraftOrderTagId::generate(),
            tag: tag.to_string(),
            created_at: Utc::now(),
        });
        draft.tags.sort_by(|a, b| a.tag.cmp(&b.tag));
        Ok(true)
    }

    async fn delete_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .write()
            .await
            .draft_orders
            .remove(external_id)
            .is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer_record(id: &str) -> CustomerRecord {
        let mut record = CustomerRecord::new(ShopifyGid::customer(id).unwrap());
        record.first_name = Some("Ada".to_string());
        record.email = Some("ada@example.com".to_string());
        record.tags = vec!["Tier 2".to_string(), "net30".to_string()];
        record.company = Some("Acme Supply".to_string());
        record.default_address = Some(AddressRecord {
            address1: Some("1 Main St".to_string()),
            city: Some("Toronto".to_string()),
            country_code: Some("CA".to_string()),
            country_name: Some("Canada".to_string()),
            ..AddressRecord::default()
        });
        record
    }

    fn draft_record(id: &str, tags: &[&str]) -> DraftOrderRecord {
        let mut record = DraftOrderRecord::new(ShopifyGid::draft_order(id).unwrap());
        record.name = Some(format!("#D{id}"));
        record.tags = tags.iter().map(ToString::to_string).collect();
        record
    }

    #[tokio::test]
    async fn test_customer_upsert_is_idempotent() {
        let store = MemoryStore::new();
        let record = customer_record("1");

        let first = CustomerStore::upsert_from_upstream(&store, &record).await.unwrap();
        let second = CustomerStore::upsert_from_upstream(&store, &record).await.unwrap();

        assert_eq!(store.customer_count().await, 1);
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(
            first.default_address.as_ref().map(|a| a.id),
            second.default_address.as_ref().map(|a| a.id)
        );
        assert_eq!(second.price_tier.as_deref(), Some("Tier 2"));
        assert_eq!(CustomerStore::list_companies(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_customer_upsert_overwrites_mutable_fields() {
        let store = MemoryStore::new();
        let mut record = customer_record("1");
        CustomerStore::upsert_from_upstream(&store, &record).await.unwrap();

        record.first_name = Some("Grace".to_string());
        record.tags = vec!["Tier 1".to_string()];
        record.default_address = None;
        let updated = CustomerStore::upsert_from_upstream(&store, &record).await.unwrap();

        assert_eq!(updated.first_name.as_deref(), Some("Grace"));
        assert_eq!(updated.price_tier.as_deref(), Some("Tier 1"));
        assert!(updated.default_address.is_none());
    }

    #[tokio::test]
    async fn test_country_name_kept_when_upstream_omits_it() {
        let store = MemoryStore::new();
        CustomerStore::upsert_from_upstream(&store, &customer_record("1"))
            .await
            .unwrap();

        let mut nameless = customer_record("2");
        if let Some(address) = nameless.default_address.as_mut() {
            address.country_name = None;
        }
        let second = CustomerStore::upsert_from_upstream(&store, &nameless)
            .await
            .unwrap();

        let first = CustomerStore::find_by_external_id(&store, &ShopifyGid::customer("1").unwrap())
            .await
            .unwrap()
            .unwrap();
        let country_name = |c: &Customer| {
            c.default_address
                .as_ref()
                .and_then(|a| a.country.as_ref())
                .map(|country| country.name.clone())
        };
        assert_eq!(country_name(&first).as_deref(), Some("Canada"));
        assert_eq!(country_name(&second).as_deref(), Some("Canada"));
    }

    #[tokio::test]
    async fn test_country_rename_visible_to_every_address() {
        let store = MemoryStore::new();
        CustomerStore::upsert_from_upstream(&store, &customer_record("1"))
            .await
            .unwrap();

        let mut renamed = customer_record("2");
        if let Some(address) = renamed.default_address.as_mut() {
            address.country_name = Some("Canada (CA)".to_string());
        }
        CustomerStore::upsert_from_upstream(&store, &renamed)
            .await
            .unwrap();

        let first = CustomerStore::find_by_external_id(&store, &ShopifyGid::customer("1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            first
                .default_address
                .and_then(|a| a.country)
                .map(|c| c.name)
                .as_deref(),
            Some("Canada (CA)")
        );
    }

    #[tokio::test]
    async fn test_company_tier_not_cleared_by_untagged_customer() {
        let store = MemoryStore::new();
        CustomerStore::upsert_from_upstream(&store, &customer_record("1"))
            .await
            .unwrap();

        let mut untagged = customer_record("2");
        untagged.tags.clear();
        CustomerStore::upsert_from_upstream(&store, &untagged).await.unwrap();

        let companies = CustomerStore::list_companies(&store).await.unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(
            companies.first().and_then(|c| c.price_tier.as_deref()),
            Some("Tier 2")
        );
    }

    #[tokio::test]
    async fn test_draft_order_tags_replaced_and_unique() {
        let store = MemoryStore::new();
        let first = draft_record("9", &["rush", "quote", "rush"]);
        DraftOrderStore::upsert_from_upstream(&store, &first)
            .await
            .unwrap();

        let second = draft_record("9", &["quote", "vip"]);
        let draft = DraftOrderStore::upsert_from_upstream(&store, &second)
            .await
            .unwrap();

        assert_eq!(draft.tag_names(), vec!["quote", "vip"]);
        assert_eq!(store.draft_order_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_tag_once() {
        let store = MemoryStore::new();
        let gid = ShopifyGid::draft_order("9").unwrap();
        DraftOrderStore::upsert_from_upstream(&store, &draft_record("9", &["quote"]))
            .await
            .unwrap();

        assert!(store.add_tag(&gid, "approved").await.unwrap());
        assert!(!store.add_tag(&gid, "approved").await.unwrap());

        let draft = DraftOrderStore::find_by_external_id(&store, &gid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(draft.tag_names(), vec!["approved", "quote"]);
    }

    #[tokio::test]
    async fn test_add_tag_unknown_draft() {
        let store = MemoryStore::new();
        let gid = ShopifyGid::draft_order("404").unwrap();
        assert!(matches!(
            store.add_tag(&gid, "x").await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_draft_order_links_cached_customer() {
        let store = MemoryStore::new();
        let customer = CustomerStore::upsert_from_upstream(&store, &customer_record("1"))
            .await
            .unwrap();

        let mut record = draft_record("9", &[]);
        record.customer_external_id = Some(customer.external_id.clone());
        DraftOrderStore::upsert_from_upstream(&store, &record).await.unwrap();

        let drafts = store.find_by_customer(&customer.external_id).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(
            drafts.first().and_then(|d| d.customer.as_ref()).map(|c| c.id),
            Some(customer.id)
        );
    }

    #[tokio::test]
    async fn test_delete_draft_order() {
        let store = MemoryStore::new();
        let gid = ShopifyGid::draft_order("9").unwrap();
        DraftOrderStore::upsert_from_upstream(&store, &draft_record("9", &["quote"]))
            .await
            .unwrap();

        assert!(store.delete_by_external_id(&gid).await.unwrap());
        assert!(!store.delete_by_external_id(&gid).await.unwrap());
        assert_eq!(store.draft_order_count().await, 0);
    }
}
