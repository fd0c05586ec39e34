//! Test doubles shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use draftline_core::{ShopifyGid, normalize_tags};

use crate::models::{CustomerRecord, DraftOrderRecord, Page};
use crate::shopify::{CommerceUpstream, ShopifyError};

/// Scripted upstream serving fixed pages.
///
/// Page `n` reports cursor `cursor-n`; asking for `after: cursor-n` returns
/// page `n + 1`.
#[derive(Default)]
pub struct FakeUpstream {
    customer_pages: Vec<Vec<CustomerRecord>>,
    draft_order_pages: Mutex<Vec<Vec<DraftOrderRecord>>>,
    fail: bool,
    page_calls: AtomicUsize,
    point_calls: AtomicUsize,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer_pages(mut self, pages: Vec<Vec<CustomerRecord>>) -> Self {
        self.customer_pages = pages;
        self
    }

    pub fn with_draft_order_pages(self, pages: Vec<Vec<DraftOrderRecord>>) -> Self {
        *self.draft_order_pages.lock().unwrap() = pages;
        self
    }

    /// Every call fails with a 503.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn point_calls(&self) -> usize {
        self.point_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ShopifyError> {
        if self.fail {
            return Err(ShopifyError::Status(503, "unavailable".to_string()));
        }
        Ok(())
    }
}

fn page_of<T: Clone>(pages: &[Vec<T>], after: Option<&str>) -> Page<T> {
    let index = after
        .and_then(|cursor| cursor.strip_prefix("cursor-"))
        .and_then(|n| n.parse::<usize>().ok())
        .map_or(0, |n| n + 1);

    Page {
        items: pages.get(index).cloned().unwrap_or_default(),
        has_next_page: index + 1 < pages.len(),
        end_cursor: Some(format!("cursor-{index}")),
    }
}

#[async_trait]
impl CommerceUpstream for FakeUpstream {
    async fn customers_page(
        &self,
        _first: i64,
        after: Option<&str>,
    ) -> Result<Page<CustomerRecord>, ShopifyError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(page_of(&self.customer_pages, after))
    }

    async fn customer(&self, id: &ShopifyGid) -> Result<Option<CustomerRecord>, ShopifyError> {
        self.point_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .customer_pages
            .iter()
            .flatten()
            .find(|c| &c.external_id == id)
            .cloned())
    }

    async fn draft_orders_page(
        &self,
        _first: i64,
        after: Option<&str>,
    ) -> Result<Page<DraftOrderRecord>, ShopifyError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(page_of(&self.draft_order_pages.lock().unwrap(), after))
    }

    async fn draft_order(
        &self,
        id: &ShopifyGid,
    ) -> Result<Option<DraftOrderRecord>, ShopifyError> {
        self.point_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .draft_order_pages
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .find(|d| &d.external_id == id)
            .cloned())
    }

    async fn add_draft_order_tag(
        &self,
        id: &ShopifyGid,
        tag: &str,
    ) -> Result<Vec<String>, ShopifyError> {
        self.check()?;
        let mut pages = self.draft_order_pages.lock().unwrap();
        let draft = pages
            .iter_mut()
            .flatten()
            .find(|d| &d.external_id == id)
            .ok_or_else(|| ShopifyError::NotFound(id.to_string()))?;

        let mut tags = draft.tags.clone();
        tags.push(tag.to_string());
        draft.tags = normalize_tags(tags);
        Ok(draft.tags.clone())
    }
}

/// A customer record with a name, email and tier tag.
pub fn customer(id: u64) -> CustomerRecord {
    let mut record = CustomerRecord::new(ShopifyGid::from_numeric(ShopifyGid::CUSTOMER, id));
    record.first_name = Some(format!("First{id}"));
    record.last_name = Some(format!("Last{id}"));
    record.email = Some(format!("customer{id}@example.com"));
    record.tags = vec!["Tier 1".to_string()];
    record
}

/// A draft order record for `customer` carrying `tags`.
pub fn draft_order(id: u64, customer: Option<u64>, tags: &[&str]) -> DraftOrderRecord {
    let mut record =
        DraftOrderRecord::new(ShopifyGid::from_numeric(ShopifyGid::DRAFT_ORDER, id));
    record.name = Some(format!("#D{id}"));
    record.status = Some("OPEN".to_string());
    record.customer_external_id =
        customer.map(|c| ShopifyGid::from_numeric(ShopifyGid::CUSTOMER, c));
    record.tags = tags.iter().map(ToString::to_string).collect();
    record
}
