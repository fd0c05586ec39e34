//! Draft order reads and tag writes for the Admin API.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use draftline_core::{ShopifyGid, normalize_tags, parse_tags};

use super::{
    AdminClient, ShopifyError,
    conversions::{convert_connection, convert_draft_order},
    queries::{self, DraftOrderData, DraftOrdersData, IdVariables, PageVariables},
};
use crate::models::{DraftOrderRecord, Page};

/// REST envelope for a draft order.
#[derive(Debug, Deserialize, Serialize)]
struct DraftOrderEnvelope {
    draft_order: RestDraftOrderTags,
}

/// The REST draft order fields touched by a tag write.
#[derive(Debug, Deserialize, Serialize)]
struct RestDraftOrderTags {
    id: u64,
    #[serde(default)]
    tags: String,
}

/// Merge `tag` into a REST tag string, returning the normalised list.
fn merge_tag(current: &str, tag: &str) -> Vec<String> {
    let mut tags = parse_tags(current);
    tags.push(tag.to_string());
    normalize_tags(tags)
}

impl AdminClient {
    /// Get a page of draft orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self))]
    pub async fn get_draft_orders(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Page<DraftOrderRecord>, ShopifyError> {
        let variables = PageVariables {
            first,
            after: after.map(str::to_string),
        };

        let response: DraftOrdersData = self
            .execute(
                queries::GET_DRAFT_ORDERS,
                queries::GET_DRAFT_ORDERS_QUERY,
                variables,
            )
            .await?;

        Ok(convert_connection(response.draft_orders, convert_draft_order))
    }

    /// Get a draft order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self), fields(draft_order_id = %id))]
    pub async fn get_draft_order(
        &self,
        id: &ShopifyGid,
    ) -> Result<Option<DraftOrderRecord>, ShopifyError> {
        let variables = IdVariables {
            id: id.to_string(),
        };

        let response: DraftOrderData = self
            .execute(
                queries::GET_DRAFT_ORDER,
                queries::GET_DRAFT_ORDER_QUERY,
                variables,
            )
            .await?;

        Ok(response.draft_order.and_then(convert_draft_order))
    }

    /// Add a tag to a draft order through the REST API.
    ///
    /// Reads the current tag string, merges `tag` in, and writes the result
    /// back. Returns the tags Shopify reports after the write.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the draft order does not exist.
    /// Returns an error if either request fails.
    #[instrument(skip(self), fields(draft_order_id = %id))]
    pub async fn add_draft_order_tag(
        &self,
        id: &ShopifyGid,
        tag: &str,
    ) -> Result<Vec<String>, ShopifyError> {
        let path = format!("draft_orders/{}", id.legacy_id());

        let current: DraftOrderEnvelope = self.rest_get(&path).await?;
        let merged = merge_tag(&current.draft_order.tags, tag);

        let body = DraftOrderEnvelope {
            draft_order: RestDraftOrderTags {
                id: current.draft_order.id,
                tags: merged.join(", "),
            },
        };

        let updated: DraftOrderEnvelope = self.rest_put(&path, &body).await?;
        Ok(parse_tags(&updated.draft_order.tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_tag_appends() {
        assert_eq!(merge_tag("quote, rush", "approved"), vec!["quote", "rush", "approved"]);
    }

    #[test]
    fn test_merge_tag_existing_is_noop() {
        assert_eq!(merge_tag("quote, rush", " rush "), vec!["quote", "rush"]);
    }

    #[test]
    fn test_merge_tag_into_empty() {
        assert_eq!(merge_tag("", "quote"), vec!["quote"]);
    }

    #[test]
    fn test_envelope_ignores_other_fields() {
        let envelope: DraftOrderEnvelope = serde_json::from_value(serde_json::json!({
            "draft_order": {"id": 42, "tags": "a, b", "name": "#D42"}
        }))
        .expect("deserialize");
        assert_eq!(envelope.draft_order.id, 42);
        assert_eq!(envelope.draft_order.tags, "a, b");
    }
}
