//! Conversions from Admin API response nodes to upstream records.

use tracing::warn;

use draftline_core::{
    AppliedDiscount, LineItemSnapshot, ShippingLineSnapshot, ShopifyGid, normalize_tags,
};

use super::queries::{
    Connection, CustomerNode, DraftOrderNode, LineItemNode, MailingAddressNode, ShippingLineNode,
};
use crate::models::{AddressRecord, CustomerRecord, DraftOrderRecord, Page};

/// Convert a connection, dropping nodes whose GID cannot be parsed.
pub fn convert_connection<N, T>(
    connection: Connection<N>,
    convert: impl Fn(N) -> Option<T>,
) -> Page<T> {
    Page {
        items: connection
            .edges
            .into_iter()
            .filter_map(|edge| convert(edge.node))
            .collect(),
        has_next_page: connection.page_info.has_next_page,
        end_cursor: connection.page_info.end_cursor,
    }
}

fn convert_address(node: MailingAddressNode) -> AddressRecord {
    AddressRecord {
        address1: node.address1,
        address2: node.address2,
        city: node.city,
        province: node.province,
        zip: node.zip,
        country_code: node.country_code_v2,
        country_name: node.country,
    }
}

pub fn convert_customer(node: CustomerNode) -> Option<CustomerRecord> {
    let external_id = match ShopifyGid::customer(&node.id) {
        Ok(gid) => gid,
        Err(e) => {
            warn!(id = %node.id, error = %e, "Skipping customer with unusable id");
            return None;
        }
    };

    let company = node
        .default_address
        .as_ref()
        .and_then(|a| a.company.clone());

    Some(CustomerRecord {
        external_id,
        first_name: node.first_name,
        last_name: node.last_name,
        email: node.email,
        tags: normalize_tags(node.tags),
        company,
        default_address: node.default_address.map(convert_address),
    })
}

fn convert_line_item(node: LineItemNode) -> LineItemSnapshot {
    let mut item = LineItemSnapshot::new(node.title, node.quantity);
    item.variant_title = node.variant_title;
    item.price = node.original_unit_price_set.map(|m| m.amount());
    item.applied_discount = node.applied_discount.map(|d| AppliedDiscount {
        title: d.title,
        value_type: d.value_type,
        value: d.value,
        amount: d.amount_set.map(|m| m.amount()),
    });
    item.extra = node.extra;
    item
}

fn convert_shipping_line(node: ShippingLineNode) -> ShippingLineSnapshot {
    ShippingLineSnapshot {
        title: node.title,
        price: node.original_price_set.map(|m| m.amount()),
        extra: node.extra,
    }
}

pub fn convert_draft_order(node: DraftOrderNode) -> Option<DraftOrderRecord> {
    let external_id = match ShopifyGid::draft_order(&node.id) {
        Ok(gid) => gid,
        Err(e) => {
            warn!(id = %node.id, error = %e, "Skipping draft order with unusable id");
            return None;
        }
    };

    let customer_external_id = node
        .customer
        .and_then(|c| ShopifyGid::customer(&c.id).ok());

    Some(DraftOrderRecord {
        external_id,
        name: node.name,
        note: node.note2,
        customer_external_id,
        shipping_address: node.shipping_address.map(convert_address),
        shipping_line: node.shipping_line.map(convert_shipping_line),
        line_items: node
            .line_items
            .edges
            .into_iter()
            .map(|edge| convert_line_item(edge.node))
            .collect(),
        status: node.status,
        invoice_url: node.invoice_url,
        tags: normalize_tags(node.tags),
        created_at: node.created_at,
        completed_at: node.completed_at,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shopify::queries::{CustomersData, DraftOrderData};
    use serde_json::json;

    #[test]
    fn test_convert_customer_page() {
        let data: CustomersData = serde_json::from_value(json!({
            "customers": {
                "edges": [
                    {
                        "cursor": "c1",
                        "node": {
                            "id": "gid://shopify/Customer/1",
                            "firstName": "Ada",
                            "lastName": "Lovelace",
                            "email": "ada@example.com",
                            "tags": ["Tier 2", " net30 "],
                            "defaultAddress": {
                                "address1": "1 Main St",
                                "address2": null,
                                "city": "Toronto",
                                "province": "Ontario",
                                "zip": "M5V",
                                "country": "Canada",
                                "countryCodeV2": "CA",
                                "company": "Acme Supply"
                            }
                        }
                    },
                    {"cursor": "c2", "node": {"id": "bogus", "firstName": null, "lastName": null, "email": null, "tags": [], "defaultAddress": null}}
                ],
                "pageInfo": {"hasNextPage": true, "endCursor": "c2"}
            }
        }))
        .unwrap();

        let page = convert_connection(data.customers, convert_customer);
        assert!(page.has_next_page);
        assert_eq!(page.end_cursor.as_deref(), Some("c2"));
        assert_eq!(page.items.len(), 1);

        let customer = page.items.first().unwrap();
        assert_eq!(customer.tags, vec!["Tier 2", "net30"]);
        assert_eq!(customer.company.as_deref(), Some("Acme Supply"));
        let address = customer.default_address.as_ref().unwrap();
        assert_eq!(address.country_code.as_deref(), Some("CA"));
        assert_eq!(address.country_name.as_deref(), Some("Canada"));
    }

    #[test]
    fn test_convert_draft_order() {
        let data: DraftOrderData = serde_json::from_value(json!({
            "draftOrder": {
                "id": "gid://shopify/DraftOrder/9",
                "name": "#D9",
                "note2": "Call before delivery",
                "status": "OPEN",
                "invoiceUrl": "https://example.com/invoice",
                "tags": ["quote"],
                "createdAt": "2026-03-01T12:00:00Z",
                "completedAt": null,
                "customer": {"id": "gid://shopify/Customer/1"},
                "shippingAddress": null,
                "shippingLine": {"title": "Freight", "code": "FRT", "originalPriceSet": {"shopMoney": {"amount": "45.0"}}},
                "lineItems": {"edges": [{"node": {
                    "title": "Hex Bolt",
                    "quantity": 40,
                    "sku": "HB-M8",
                    "variantTitle": "M8",
                    "originalUnitPriceSet": {"shopMoney": {"amount": "0.35"}},
                    "appliedDiscount": null
                }}]}
            }
        }))
        .unwrap();

        let record = convert_draft_order(data.draft_order.unwrap()).unwrap();
        assert_eq!(record.external_id.legacy_id(), "9");
        assert_eq!(record.note.as_deref(), Some("Call before delivery"));
        assert_eq!(
            record.customer_external_id.as_ref().map(ShopifyGid::as_str),
            Some("gid://shopify/Customer/1")
        );
        assert_eq!(record.line_items.len(), 1);
        assert_eq!(
            record.line_items.first().and_then(|i| i.price.as_deref()),
            Some("0.35")
        );
        assert_eq!(
            record.line_items.first().and_then(|i| i.extra.get("sku")),
            Some(&json!("HB-M8"))
        );
        let shipping = record.shipping_line.unwrap();
        assert_eq!(shipping.price.as_deref(), Some("45.0"));
        assert_eq!(shipping.extra.get("code"), Some(&json!("FRT")));
        assert!(!shipping.extra.contains_key("originalPriceSet"));
        assert!(record.created_at.is_some());
    }
}
