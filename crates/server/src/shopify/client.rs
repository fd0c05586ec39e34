//! Shopify Admin API client.
//!
//! GraphQL reads go through [`AdminClient::execute`]; the REST endpoints used
//! for tag writes go through [`AdminClient::rest_get`] and
//! [`AdminClient::rest_put`]. Both authenticate with the store's Admin API
//! access token.

use std::sync::Arc;

use graphql_client::QueryBody;
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::config::ShopifyConfig;

use super::{GraphQLError, GraphQLErrorLocation, ShopifyError};

/// Shopify Admin API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    store: String,
    api_version: String,
    access_token: SecretString,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

impl AdminClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                store: config.store.clone(),
                api_version: config.api_version.clone(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    fn graphql_endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.inner.store, self.inner.api_version
        )
    }

    fn rest_endpoint(&self, path: &str) -> String {
        format!(
            "https://{}/admin/api/{}/{}.json",
            self.inner.store,
            self.inner.api_version,
            path.trim_matches('/')
        )
    }

    /// Map throttling and auth failures shared by GraphQL and REST calls.
    fn check_status(response: &Response) -> Result<(), ShopifyError> {
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split('.').next())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        Ok(())
    }

    /// Execute a GraphQL operation.
    pub(super) async fn execute<V, R>(
        &self,
        operation_name: &'static str,
        query: &'static str,
        variables: V,
    ) -> Result<R, ShopifyError>
    where
        V: Serialize + Send,
        R: DeserializeOwned,
    {
        let body = QueryBody {
            variables,
            query,
            operation_name,
        };

        let response = self
            .inner
            .client
            .post(self.graphql_endpoint())
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        Self::check_status(&response)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status(status, text));
        }

        let graphql_response: GraphQLResponse<R> = response.json().await?;

        if let Some(errors) = graphql_response.errors
            && !errors.is_empty()
        {
            let converted_errors: Vec<GraphQLError> = errors
                .into_iter()
                .map(|e| GraphQLError {
                    message: e.message,
                    locations: e
                        .locations
                        .into_iter()
                        .map(|l| GraphQLErrorLocation {
                            line: l.line,
                            column: l.column,
                        })
                        .collect(),
                    path: e.path,
                })
                .collect();
            return Err(ShopifyError::GraphQL(converted_errors));
        }

        graphql_response.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    /// GET a REST resource (`path` without the `.json` suffix).
    pub(super) async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .get(self.rest_endpoint(path))
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .send()
            .await?;

        Self::read_rest(response, path).await
    }

    /// PUT a JSON body to a REST resource.
    pub(super) async fn rest_put<B, T>(&self, path: &str, body: &B) -> Result<T, ShopifyError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .put(self.rest_endpoint(path))
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
            .json(body)
            .send()
            .await?;

        Self::read_rest(response, path).await
    }

    async fn read_rest<T: DeserializeOwned>(
        response: Response,
        path: &str,
    ) -> Result<T, ShopifyError> {
        Self::check_status(&response)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ShopifyError::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status(status, text));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AdminClient {
        AdminClient::new(&ShopifyConfig {
            store: "draftline-test.myshopify.com".to_string(),
            api_version: "2025-01".to_string(),
            access_token: SecretString::from("shpat_test"),
            webhook_secret: SecretString::from("whsec_test"),
        })
    }

    #[test]
    fn test_graphql_endpoint() {
        assert_eq!(
            client().graphql_endpoint(),
            "https://draftline-test.myshopify.com/admin/api/2025-01/graphql.json"
        );
    }

    #[test]
    fn test_rest_endpoint_trims_slashes() {
        assert_eq!(
            client().rest_endpoint("/draft_orders/42"),
            "https://draftline-test.myshopify.com/admin/api/2025-01/draft_orders/42.json"
        );
    }
}
