//! Customer and company models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use draftline_core::{CompanyId, CustomerId, ShopifyGid, derive_price_tier};

use super::address::{Address, AddressRecord};

/// A customer snapshot as reported by the upstream platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Upstream GID (conflict key).
    pub external_id: ShopifyGid,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Normalised tags; the first names the price tier.
    pub tags: Vec<String>,
    /// Company name, if the customer belongs to one.
    pub company: Option<String>,
    /// Default address.
    pub default_address: Option<AddressRecord>,
}

impl CustomerRecord {
    /// Create a record with only the external ID set.
    #[must_use]
    pub const fn new(external_id: ShopifyGid) -> Self {
        Self {
            external_id,
            first_name: None,
            last_name: None,
            email: None,
            tags: Vec::new(),
            company: None,
            default_address: None,
        }
    }

    /// Price tier derived from the record's tags.
    #[must_use]
    pub fn price_tier(&self) -> Option<String> {
        derive_price_tier(&self.tags)
    }

    /// Company name with surrounding whitespace removed, if non-empty.
    #[must_use]
    pub fn company_name(&self) -> Option<&str> {
        self.company
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// A cached company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Row ID.
    pub id: CompanyId,
    /// Company name (unique).
    pub name: String,
    /// Price tier applied to the company's customers.
    pub price_tier: Option<String>,
}

/// A cached customer with company and default address loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
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
    /// Company, if any.
    pub company: Option<Company>,
    /// Default address, if any.
    pub default_address: Option<Address>,
    /// Derived price tier.
    pub price_tier: Option<String>,
    /// Tags in upstream order.
    pub tags: Vec<String>,
    /// When the row was first cached.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
    /// When the row was last refreshed from upstream.
    pub last_synced_at: Option<DateTime<Utc>>,
}
