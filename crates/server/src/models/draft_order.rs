//! Draft order models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use draftline_core::{
    CustomerId, DraftOrderId, DraftOrderTagId, LineItemSnapshot, ShippingLineSnapshot, ShopifyGid,
};

use super::address::{Address, AddressRecord};

/// A draft order snapshot as reported by the upstream platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOrderRecord {
    /// Upstream GID (conflict key).
    pub external_id: ShopifyGid,
    /// Display name (e.g. `#D12`).
    pub name: Option<String>,
    /// Order note.
    pub note: Option<String>,
    /// GID of the customer the draft belongs to.
    pub customer_external_id: Option<ShopifyGid>,
    /// Shipping address.
    pub shipping_address: Option<AddressRecord>,
    /// Shipping line snapshot.
    pub shipping_line: Option<ShippingLineSnapshot>,
    /// Line item snapshots.
    pub line_items: Vec<LineItemSnapshot>,
    /// Status label (`OPEN`, `INVOICE_SENT`, `COMPLETED`).
    pub status: Option<String>,
    /// Invoice URL sent to the customer.
    pub invoice_url: Option<String>,
    /// Normalised tags.
    pub tags: Vec<String>,
    /// When the draft was created upstream.
    pub created_at: Option<DateTime<Utc>>,
    /// When the draft was completed upstream.
    pub completed_at: Option<DateTime<Utc>>,
}

impl DraftOrderRecord {
    /// Create a record with only the external ID set.
    #[must_use]
    pub const fn new(external_id: ShopifyGid) -> Self {
        Self {
            external_id,
            name: None,
            note: None,
            customer_external_id: None,
            shipping_address: None,
            shipping_line: None,
            line_items: Vec::new(),
            status: None,
            invoice_url: None,
            tags: Vec::new(),
            created_at: None,
            completed_at: None,
        }
    }
}

/// The customer fields loaded alongside a cached draft order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    /// Row ID.
    pub id: CustomerId,
    /// Upstream GID.
    pub external_id: ShopifyGid,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
}

/// A tag attached to a cached draft order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrderTag {
    /// Row ID.
    pub id: DraftOrderTagId,
    /// Tag text (unique per draft order).
    pub tag: String,
    /// When the tag was first cached.
    pub created_at: DateTime<Utc>,
}

/// A cached draft order with customer, shipping address and tags loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftOrder {
    /// Row ID.
    pub id: DraftOrderId,
    /// Upstream GID.
    pub external_id: ShopifyGid,
    /// Display name.
    pub name: Option<String>,
    /// Order note.
    pub note: Option<String>,
    /// Linked customer, if cached.
    pub customer: Option<CustomerSummary>,
    /// Customer GID as reported upstream (kept even when the customer is not cached).
    pub customer_external_id: Option<ShopifyGid>,
    /// Shipping address.
    pub shipping_address: Option<Address>,
    /// Shipping line snapshot.
    pub shipping_line: Option<ShippingLineSnapshot>,
    /// Line item snapshots.
    pub line_items: Vec<LineItemSnapshot>,
    /// Status label.
    pub status: Option<String>,
    /// Invoice URL.
    pub invoice_url: Option<String>,
    /// Tags, sorted by tag text.
    pub tags: Vec<DraftOrderTag>,
    /// When the draft was created upstream.
    pub upstream_created_at: Option<DateTime<Utc>>,
    /// When the draft was completed upstream.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the row was first cached.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
    /// When the row was last refreshed from upstream.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl DraftOrder {
    /// Tag texts in stored order.
    #[must_use]
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.tag.as_str()).collect()
    }
}
