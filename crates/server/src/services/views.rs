//! JSON shapes returned by the read API.
//!
//! Each view converts from both the cached entity and the upstream record, so
//! a response looks the same whichever side served it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use draftline_core::{LineItemSnapshot, ShippingLineSnapshot};

use crate::models::{Address, AddressRecord, Customer, CustomerRecord, DraftOrder, DraftOrderRecord};

/// Placeholder for missing values in the company listing.
pub const NOT_AVAILABLE: &str = "N/A";

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressView {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
}

impl From<Address> for AddressView {
    fn from(address: Address) -> Self {
        let (country_code, country) = address
            .country
            .map_or((None, None), |c| (Some(c.code), Some(c.name)));
        Self {
            address1: address.address1,
            address2: address.address2,
            city: address.city,
            province: address.province,
            zip: address.zip,
            country_code,
            country,
        }
    }
}

impl From<AddressRecord> for AddressView {
    fn from(record: AddressRecord) -> Self {
        let (country_code, country) = record
            .country()
            .map_or((None, None), |(code, name)| (Some(code), Some(name)));
        Self {
            address1: record.address1,
            address2: record.address2,
            city: record.city,
            province: record.province,
            zip: record.zip,
            country_code,
            country,
        }
    }
}

/// A customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    /// Shopify GID.
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub price_tier: Option<String>,
    pub tags: Vec<String>,
    pub default_address: Option<AddressView>,
}

impl From<Customer> for CustomerView {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.external_id.into_inner(),
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            company: customer.company.map(|c| c.name),
            price_tier: customer.price_tier,
            tags: customer.tags,
            default_address: customer.default_address.map(Into::into),
        }
    }
}

impl From<CustomerRecord> for CustomerView {
    fn from(record: CustomerRecord) -> Self {
        let company = record.company_name().map(str::to_string);
        let price_tier = record.price_tier();
        Self {
            id: record.external_id.into_inner(),
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            company,
            price_tier,
            tags: record.tags,
            default_address: record.default_address.map(Into::into),
        }
    }
}

/// A customer with their company, for the company listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCompanyView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub price_tier: String,
}

impl From<CustomerView> for CustomerCompanyView {
    fn from(view: CustomerView) -> Self {
        let or_na = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Self {
            id: view.id,
            first_name: or_na(view.first_name),
            last_name: or_na(view.last_name),
            company: or_na(view.company),
            price_tier: or_na(view.price_tier),
        }
    }
}

/// A draft order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderView {
    /// Shopify GID.
    pub id: String,
    pub name: Option<String>,
    pub note: Option<String>,
    pub status: Option<String>,
    pub invoice_url: Option<String>,
    /// Shopify GID of the customer, if any.
    pub customer_id: Option<String>,
    pub shipping_address: Option<AddressView>,
    pub shipping_line: Option<ShippingLineSnapshot>,
    pub line_items: Vec<LineItemSnapshot>,
    /// Sorted.
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn sorted_tags<I: IntoIterator<Item = String>>(tags: I) -> Vec<String> {
    let mut tags: Vec<String> = tags.into_iter().collect();
    tags.sort();
    tags.dedup();
    tags
}

impl From<DraftOrder> for DraftOrderView {
    fn from(draft: DraftOrder) -> Self {
        Self {
            id: draft.external_id.into_inner(),
            name: draft.name,
            note: draft.note,
            status: draft.status,
            invoice_url: draft.invoice_url,
            customer_id: draft
                .customer
                .map(|c| c.external_id)
                .or(draft.customer_external_id)
                .map(draftline_core::ShopifyGid::into_inner),
            shipping_address: draft.shipping_address.map(Into::into),
            shipping_line: draft.shipping_line,
            line_items: draft.line_items,
            tags: sorted_tags(draft.tags.into_iter().map(|t| t.tag)),
            created_at: draft.upstream_created_at,
            completed_at: draft.completed_at,
        }
    }
}

impl From<DraftOrderRecord> for DraftOrderView {
    fn from(record: DraftOrderRecord) -> Self {
        Self {
            id: record.external_id.into_inner(),
            name: record.name,
            note: record.note,
            status: record.status,
            invoice_url: record.invoice_url,
            customer_id: record
                .customer_external_id
                .map(draftline_core::ShopifyGid::into_inner),
            shipping_address: record.shipping_address.map(Into::into),
            shipping_line: record.shipping_line,
            line_items: record.line_items,
            tags: sorted_tags(record.tags),
            created_at: record.created_at,
            completed_at: record.completed_at,
        }
    }
}

/// Tags on a draft order after a tag write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderTagsView {
    pub id: String,
    pub tags: Vec<String>,
}
