//! Point-in-time snapshots of draft order contents.
//!
//! Line items and the shipping line are stored as JSON documents rather than
//! relational columns: their upstream shape drifts between API versions. The
//! fields Draftline reads are typed; everything else is kept verbatim in
//! `extra` so a snapshot survives a round-trip through the store unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A draft order line item as it looked at sync time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemSnapshot {
    /// Product title.
    pub title: String,
    /// Quantity ordered.
    pub quantity: i64,
    /// Variant title (e.g. `Large / Blue`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_title: Option<String>,
    /// Unit price as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Discount applied to this line, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_discount: Option<AppliedDiscount>,
    /// Upstream fields Draftline does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItemSnapshot {
    /// Create a snapshot with only the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, quantity: i64) -> Self {
        Self {
            title: title.into(),
            quantity,
            variant_title: None,
            price: None,
            applied_discount: None,
            extra: Map::new(),
        }
    }
}

/// A discount applied to a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscount {
    /// Discount title shown to the customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `PERCENTAGE` or `FIXED_AMOUNT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Discount value (percent or amount, per `value_type`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Total discount amount as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

/// The shipping line chosen for a draft order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingLineSnapshot {
    /// Shipping method title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Shipping price as a decimal string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Upstream fields Draftline does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_line_item_keeps_unknown_fields() {
        let raw = json!({
            "title": "Hex Bolt",
            "quantity": 40,
            "variantTitle": "M8",
            "price": "0.35",
            "sku": "HB-M8",
        });

        let item: LineItemSnapshot = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(item.title, "Hex Bolt");
        assert_eq!(item.extra.get("sku"), Some(&json!("HB-M8")));
        assert_eq!(serde_json::to_value(&item).unwrap(), raw);
    }

    #[test]
    fn test_shipping_line_accepts_rest_shape() {
        let raw = json!({"title": "Freight", "price": "45.00", "custom": true, "handle": null});
        let line: ShippingLineSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(line.title.as_deref(), Some("Freight"));
        assert_eq!(line.price.as_deref(), Some("45.00"));
        assert_eq!(line.extra.get("custom"), Some(&json!(true)));
    }

    #[test]
    fn test_line_item_new_omits_empty_optionals() {
        let item = LineItemSnapshot::new("Washer", 3);
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"title": "Washer", "quantity": 3})
        );
    }
}
