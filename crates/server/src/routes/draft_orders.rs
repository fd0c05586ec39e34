//! Draft order routes.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::views::{DraftOrderTagsView, DraftOrderView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddTagRequest {
    pub tag: String,
}

/// `GET /api/draft-orders`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<DraftOrderView>>> {
    Ok(Json(state.query().list_draft_orders().await?))
}

/// `GET /api/draft-orders/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DraftOrderView>> {
    state
        .query()
        .get_draft_order(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

/// `POST /api/draft-orders/{id}/tags`
///
/// Writes the tag upstream first; the cached row follows.
#[instrument(skip(state))]
pub async fn add_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddTagRequest>,
) -> Result<Json<DraftOrderTagsView>> {
    Ok(Json(
        state.query().add_draft_order_tag(&id, &request.tag).await?,
    ))
}
