//! GraphQL documents and response shapes for the Admin API.
//!
//! Documents are sent as `graphql_client::QueryBody` values; responses are
//! deserialized into the plain serde types below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Documents
// =============================================================================

macro_rules! customer_fields {
    () => {
        r"
fragment CustomerFields on Customer {
  id
  firstName
  lastName
  email
  tags
  defaultAddress {
    address1
    address2
    city
    province
    zip
    country
    countryCodeV2
    company
  }
}
"
    };
}

macro_rules! draft_order_fields {
    () => {
        r"
fragment DraftOrderFields on DraftOrder {
  id
  name
  note2
  status
  invoiceUrl
  tags
  createdAt
  completedAt
  customer {
    id
  }
  shippingAddress {
    address1
    address2
    city
    province
    zip
    country
    countryCodeV2
  }
  shippingLine {
    title
    code
    source
    custom
    originalPriceSet {
      shopMoney {
        amount
      }
    }
  }
  lineItems(first: 100) {
    edges {
      node {
        title
        quantity
        sku
        vendor
        variantTitle
        originalUnitPriceSet {
          shopMoney {
            amount
          }
        }
        appliedDiscount {
          title
          valueType
          value
          amountSet {
            shopMoney {
              amount
            }
          }
        }
      }
    }
  }
}
"
    };
}

/// `GetCustomers` operation name.
pub const GET_CUSTOMERS: &str = "GetCustomers";

/// `GetCustomer` operation name.
pub const GET_CUSTOMER: &str = "GetCustomer";

/// `GetDraftOrders` operation name.
pub const GET_DRAFT_ORDERS: &str = "GetDraftOrders";

/// `GetDraftOrder` operation name.
pub const GET_DRAFT_ORDER: &str = "GetDraftOrder";

/// Paginated customers query.
pub const GET_CUSTOMERS_QUERY: &str = concat!(
    r"
query GetCustomers($first: Int!, $after: String) {
  customers(first: $first, after: $after) {
    edges {
      cursor
      node {
        ...CustomerFields
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}
",
    customer_fields!()
);

/// Single customer query.
pub const GET_CUSTOMER_QUERY: &str = concat!(
    r"
query GetCustomer($id: ID!) {
  customer(id: $id) {
    ...CustomerFields
  }
}
",
    customer_fields!()
);

/// Paginated draft orders query.
pub const GET_DRAFT_ORDERS_QUERY: &str = concat!(
    r"
query GetDraftOrders($first: Int!, $after: String) {
  draftOrders(first: $first, after: $after, sortKey: CREATED_AT, reverse: true) {
    edges {
      cursor
      node {
        ...DraftOrderFields
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}
",
    draft_order_fields!()
);

/// Single draft order query.
pub const GET_DRAFT_ORDER_QUERY: &str = concat!(
    r"
query GetDraftOrder($id: ID!) {
  draftOrder(id: $id) {
    ...DraftOrderFields
  }
}
",
    draft_order_fields!()
);

// =============================================================================
// Variables
// =============================================================================

/// Variables for paginated connection queries.
#[derive(Debug, Clone, Serialize)]
pub struct PageVariables {
    /// Page size.
    pub first: i64,
    /// Cursor to resume after.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// Variables for single-node queries.
#[derive(Debug, Clone, Serialize)]
pub struct IdVariables {
    /// Node GID.
    pub id: String,
}

// =============================================================================
// Responses
// =============================================================================

/// A cursor-paginated connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    /// Edges in upstream order.
    pub edges: Vec<Edge<N>>,
    /// Pagination state.
    pub page_info: PageInfo,
}

/// A connection edge.
#[derive(Debug, Clone, Deserialize)]
pub struct Edge<N> {
    /// Opaque cursor for this edge.
    #[serde(default)]
    pub cursor: Option<String>,
    /// The node.
    pub node: N,
}

/// Connection pagination state.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page follows.
    pub has_next_page: bool,
    /// Cursor of the last edge.
    pub end_cursor: Option<String>,
}

/// Nested connection without pagination state.
#[derive(Debug, Clone, Deserialize)]
pub struct Edges<N> {
    /// Edges in upstream order.
    pub edges: Vec<Edge<N>>,
}

/// Response data for [`GET_CUSTOMERS_QUERY`].
#[derive(Debug, Deserialize)]
pub struct CustomersData {
    /// Customer connection.
    pub customers: Connection<CustomerNode>,
}

/// Response data for [`GET_CUSTOMER_QUERY`].
#[derive(Debug, Deserialize)]
pub struct CustomerData {
    /// The customer, if it exists.
    pub customer: Option<CustomerNode>,
}

/// Response data for [`GET_DRAFT_ORDERS_QUERY`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrdersData {
    /// Draft order connection.
    pub draft_orders: Connection<DraftOrderNode>,
}

/// Response data for [`GET_DRAFT_ORDER_QUERY`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderData {
    /// The draft order, if it exists.
    pub draft_order: Option<DraftOrderNode>,
}

/// `CustomerFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNode {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub default_address: Option<MailingAddressNode>,
}

/// `MailingAddress` fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailingAddressNode {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub country_code_v2: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// `DraftOrderFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderNode {
    pub id: String,
    pub name: Option<String>,
    pub note2: Option<String>,
    pub status: Option<String>,
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub customer: Option<IdNode>,
    pub shipping_address: Option<MailingAddressNode>,
    pub shipping_line: Option<ShippingLineNode>,
    pub line_items: Edges<LineItemNode>,
}

/// A node reference carrying only its GID.
#[derive(Debug, Clone, Deserialize)]
pub struct IdNode {
    pub id: String,
}

/// Draft order line item fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemNode {
    pub title: String,
    pub quantity: i64,
    pub variant_title: Option<String>,
    pub original_unit_price_set: Option<MoneyBag>,
    pub applied_discount: Option<AppliedDiscountNode>,
    /// Requested fields not modelled above (`sku`, `vendor`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Draft order applied discount fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscountNode {
    pub title: Option<String>,
    pub value_type: Option<String>,
    pub value: Option<f64>,
    pub amount_set: Option<MoneyBag>,
}

/// Draft order shipping line fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLineNode {
    pub title: Option<String>,
    pub original_price_set: Option<MoneyBag>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A money amount in shop and presentment currencies (shop only requested).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBag {
    pub shop_money: MoneyV2,
}

/// A decimal money amount.
#[derive(Debug, Clone, Deserialize)]
pub struct MoneyV2 {
    pub amount: String,
}

impl MoneyBag {
    /// Shop-currency amount.
    #[must_use]
    pub fn amount(&self) -> String {
        self.shop_money.amount.clone()
    }
}
