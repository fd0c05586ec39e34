//! Upstream client for the Shopify Admin API.
//!
//! # Security
//!
//! The Admin API access token grants read/write access to the store's
//! customers and draft orders. It lives in [`AdminClient`] only and is never
//! logged.
//!
//! # Architecture
//!
//! - GraphQL reads (`customers`, `draftOrders`) with cursor pagination
//! - REST writes for draft order tags (`GET`/`PUT draft_orders/{id}.json`)
//! - Responses converted to upstream records ([`CustomerRecord`],
//!   [`DraftOrderRecord`]) so the store and the read path share one shape
//!
//! Callers depend on [`CommerceUpstream`] rather than the client, so tests
//! can substitute a scripted upstream.

mod client;
mod conversions;
mod customers;
mod draft_orders;
pub mod queries;

pub use client::AdminClient;

use async_trait::async_trait;
use thiserror::Error;

use draftline_core::ShopifyGid;

use crate::models::{CustomerRecord, DraftOrderRecord, Page};

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Non-success HTTP status.
    #[error("Unexpected status {0}: {1}")]
    Status(u16, String),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The upstream commerce platform, as seen by the cache.
#[async_trait]
pub trait CommerceUpstream: Send + Sync {
    /// One page of customers.
    async fn customers_page(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Page<CustomerRecord>, ShopifyError>;

    /// A single customer, or `None` if upstream has no such customer.
    async fn customer(&self, id: &ShopifyGid) -> Result<Option<CustomerRecord>, ShopifyError>;

    /// One page of draft orders, newest first.
    async fn draft_orders_page(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Page<DraftOrderRecord>, ShopifyError>;

    /// A single draft order, or `None` if upstream has no such draft order.
    async fn draft_order(&self, id: &ShopifyGid)
    -> Result<Option<DraftOrderRecord>, ShopifyError>;

    /// Add a tag to a draft order, returning its tags after the write.
    async fn add_draft_order_tag(
        &self,
        id: &ShopifyGid,
        tag: &str,
    ) -> Result<Vec<String>, ShopifyError>;
}

#[async_trait]
impl CommerceUpstream for AdminClient {
    async fn customers_page(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Page<CustomerRecord>, ShopifyError> {
        self.get_customers(first, after).await
    }

    async fn customer(&self, id: &ShopifyGid) -> Result<Option<CustomerRecord>, ShopifyError> {
        self.get_customer(id).await
    }

    async fn draft_orders_page(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Page<DraftOrderRecord>, ShopifyError> {
        self.get_draft_orders(first, after).await
    }

    async fn draft_order(
        &self,
        id: &ShopifyGid,
    ) -> Result<Option<DraftOrderRecord>, ShopifyError> {
        self.get_draft_order(id).await
    }

    async fn add_draft_order_tag(
        &self,
        id: &ShopifyGid,
        tag: &str,
    ) -> Result<Vec<String>, ShopifyError> {
        AdminClient::add_draft_order_tag(self, id, tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("draft_orders/123".to_string());
        assert_eq!(err.to_string(), "Not found: draft_orders/123");

        let err = ShopifyError::Status(502, "Bad Gateway".to_string());
        assert_eq!(err.to_string(), "Unexpected status 502: Bad Gateway");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                locations: vec![GraphQLErrorLocation { line: 1, column: 2 }],
                path: vec![],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }
}
