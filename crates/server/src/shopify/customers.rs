//! Customer reads for the Admin API.

use tracing::instrument;

use draftline_core::ShopifyGid;

use super::{
    AdminClient, ShopifyError,
    conversions::{convert_connection, convert_customer},
    queries::{self, CustomerData, CustomersData, IdVariables, PageVariables},
};
use crate::models::{CustomerRecord, Page};

impl AdminClient {
    /// Get a page of customers.
    ///
    /// # Arguments
    ///
    /// * `first` - Page size (Shopify caps connections at 250)
    /// * `after` - Cursor returned by the previous page
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self))]
    pub async fn get_customers(
        &self,
        first: i64,
        after: Option<&str>,
    ) -> Result<Page<CustomerRecord>, ShopifyError> {
        let variables = PageVariables {
            first,
            after: after.map(str::to_string),
        };

        let response: CustomersData = self
            .execute(queries::GET_CUSTOMERS, queries::GET_CUSTOMERS_QUERY, variables)
            .await?;

        Ok(convert_connection(response.customers, convert_customer))
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(
        &self,
        id: &ShopifyGid,
    ) -> Result<Option<CustomerRecord>, ShopifyError> {
        let variables = IdVariables {
            id: id.to_string(),
        };

        let response: CustomerData = self
            .execute(queries::GET_CUSTOMER, queries::GET_CUSTOMER_QUERY, variables)
            .await?;

        Ok(response.customer.and_then(convert_customer))
    }
}
