//! Customer read routes.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use draftline_core::TagFilter;

use crate::error::{AppError, Result};
use crate::services::views::{CustomerCompanyView, CustomerView, DraftOrderView};
use crate::state::AppState;

/// Tag filters for a customer's draft orders, as comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct DraftOrderFilterParams {
    pub include_tags: Option<String>,
    pub exclude_tags: Option<String>,
}

/// `GET /api/customers`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CustomerView>>> {
    Ok(Json(state.query().list_customers().await?))
}

/// `GET /api/customers/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerView>> {
    state
        .query()
        .get_customer(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

/// `GET /api/customers/companies`
#[instrument(skip(state))]
pub async fn companies(State(state): State<AppState>) -> Result<Json<Vec<CustomerCompanyView>>> {
    Ok(Json(state.query().customers_with_companies().await?))
}

/// `GET /api/companies/price-tiers`
#[instrument(skip(state))]
pub async fn price_tiers(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, Option<String>>> {
    Json(state.query().company_price_tiers().await)
}

/// `GET /api/customers/{id}/draft-orders`
#[instrument(skip(state))]
pub async fn draft_orders(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DraftOrderFilterParams>,
) -> Result<Json<Vec<DraftOrderView>>> {
    let filter = TagFilter::from_params(
        params.include_tags.as_deref(),
        params.exclude_tags.as_deref(),
    );
    Ok(Json(
        state.query().draft_orders_for_customer(&id, &filter).await?,
    ))
}
