//! REST-shaped webhook payloads and their conversion to upstream records.
//!
//! Webhook bodies use the REST resource format (snake_case fields, tags as a
//! comma-separated string), not the GraphQL shape the client reads.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use draftline_core::{
    AppliedDiscount, LineItemSnapshot, ShippingLineSnapshot, ShopifyGid, normalize_tags,
    parse_tags,
};

use crate::models::{AddressRecord, CustomerRecord, DraftOrderRecord};

/// Tags arrive as `"a, b"` on REST payloads and as a list elsewhere.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsField {
    Csv(String),
    List(Vec<String>),
}

impl TagsField {
    fn into_tags(self) -> Vec<String> {
        match self {
            Self::Csv(raw) => parse_tags(&raw),
            Self::List(list) => normalize_tags(list),
        }
    }
}

fn tags(field: Option<TagsField>) -> Vec<String> {
    field.map(TagsField::into_tags).unwrap_or_default()
}

/// Resolve the external id of a payload.
///
/// Prefers `admin_graphql_api_id`; falls back to the numeric REST `id`.
pub fn external_id(
    resource: &str,
    admin_graphql_api_id: Option<&str>,
    id: Option<&Value>,
) -> Option<ShopifyGid> {
    let admin_gid =
        admin_graphql_api_id.and_then(|raw| ShopifyGid::for_resource(resource, raw).ok());
    if admin_gid.is_some() {
        return admin_gid;
    }

    match id? {
        Value::Number(n) => n.as_u64().map(|n| ShopifyGid::from_numeric(resource, n)),
        Value::String(s) => ShopifyGid::for_resource(resource, s).ok(),
        _ => None,
    }
}

/// Strip a `{"<key>": {...}}` envelope if present.
pub fn unwrap_envelope(mut body: Value, key: &str) -> Value {
    match body.get_mut(key) {
        Some(inner) if inner.is_object() => inner.take(),
        _ => body,
    }
}

/// REST address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestAddress {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub company: Option<String>,
}

impl From<RestAddress> for AddressRecord {
    fn from(address: RestAddress) -> Self {
        Self {
            address1: address.address1,
            address2: address.address2,
            city: address.city,
            province: address.province,
            zip: address.zip,
            country_code: address.country_code,
            country_name: address.country,
        }
    }
}

/// `customers/update` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerPayload {
    pub id: Option<Value>,
    pub admin_graphql_api_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub tags: Option<TagsField>,
    pub default_address: Option<RestAddress>,
}

impl CustomerPayload {
    /// Convert to a record, or `None` if the payload carries no usable id.
    #[must_use]
    pub fn into_record(self) -> Option<CustomerRecord> {
        let gid = external_id(
            ShopifyGid::CUSTOMER,
            self.admin_graphql_api_id.as_deref(),
            self.id.as_ref(),
        )?;

        let company = self
            .default_address
            .as_ref()
            .and_then(|a| a.company.clone());

        Some(CustomerRecord {
            external_id: gid,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            tags: tags(self.tags),
            company,
            default_address: self.default_address.map(Into::into),
        })
    }
}

/// Customer reference embedded in a draft order payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRef {
    pub id: Option<Value>,
    pub admin_graphql_api_id: Option<String>,
}

/// REST applied discount. `value` is a decimal string on REST payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct RestAppliedDiscount {
    pub title: Option<String>,
    pub value_type: Option<String>,
    pub value: Option<Value>,
    pub amount: Option<String>,
}

/// REST draft order line item.
#[derive(Debug, Clone, Deserialize)]
pub struct RestLineItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub quantity: i64,
    pub variant_title: Option<String>,
    pub price: Option<String>,
    pub applied_discount: Option<RestAppliedDiscount>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<RestLineItem> for LineItemSnapshot {
    fn from(item: RestLineItem) -> Self {
        let mut snapshot = Self::new(item.title, item.quantity);
        snapshot.variant_title = item.variant_title;
        snapshot.price = item.price;
        snapshot.applied_discount = item.applied_discount.map(|d| AppliedDiscount {
            title: d.title,
            value_type: d.value_type,
            value: d.value.as_ref().and_then(|v| {
                v.as_f64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            }),
            amount: d.amount,
        });
        snapshot.extra = item.extra;
        snapshot
    }
}

/// REST shipping line.
#[derive(Debug, Clone, Deserialize)]
pub struct RestShippingLine {
    pub title: Option<String>,
    pub price: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `draft_orders/create` and `draft_orders/update` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftOrderPayload {
    pub id: Option<Value>,
    pub admin_graphql_api_id: Option<String>,
    pub name: Option<String>,
    pub note: Option<String>,
    pub status: Option<String>,
    pub invoice_url: Option<String>,
    pub tags: Option<TagsField>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub customer: Option<CustomerRef>,
    pub shipping_address: Option<RestAddress>,
    pub shipping_line: Option<RestShippingLine>,
    #[serde(default)]
    pub line_items: Vec<RestLineItem>,
}

impl DraftOrderPayload {
    /// Convert to a record, or `None` if the payload carries no usable id.
    #[must_use]
    pub fn into_record(self) -> Option<DraftOrderRecord> {
        let gid = external_id(
            ShopifyGid::DRAFT_ORDER,
            self.admin_graphql_api_id.as_deref(),
            self.id.as_ref(),
        )?;

        let customer_external_id = self.customer.and_then(|c| {
            external_id(
                ShopifyGid::CUSTOMER,
                c.admin_graphql_api_id.as_deref(),
                c.id.as_ref(),
            )
        });

        Some(DraftOrderRecord {
            external_id: gid,
            name: self.name,
            note: self.note,
            customer_external_id,
            shipping_address: self.shipping_address.map(Into::into),
            shipping_line: self.shipping_line.map(|s| ShippingLineSnapshot {
                title: s.title,
                price: s.price,
                extra: s.extra,
            }),
            line_items: self.line_items.into_iter().map(Into::into).collect(),
            status: self.status.map(|s| s.to_uppercase()),
            invoice_url: self.invoice_url,
            tags: tags(self.tags),
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

/// `draft_orders/delete` payload: only the id is guaranteed.
#[derive(Debug, Clone, Deserialize)]
pub struct DeletePayload {
    pub id: Option<Value>,
    pub admin_graphql_api_id: Option<String>,
}
