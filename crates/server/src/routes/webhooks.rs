//! Shopify webhook receivers.
//!
//! Every delivery gets `200 {"ok": true}`, whatever the outcome.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde_json::{Value, json};

use crate::state::AppState;
use crate::webhooks::{SIGNATURE_HEADER, WebhookTopic};

async fn receive(
    state: &AppState,
    topic: WebhookTopic,
    headers: &HeaderMap,
    body: &Bytes,
) -> Json<Value> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state.webhooks().handle(topic, signature, body).await;

    Json(json!({ "ok": true }))
}

/// `POST /webhooks/shopify/customers/update`
pub async fn customers_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    receive(&state, WebhookTopic::CustomerUpdate, &headers, &body).await
}

/// `POST /webhooks/shopify/draft_orders/create`
pub async fn draft_orders_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    receive(&state, WebhookTopic::DraftOrderCreate, &headers, &body).await
}

/// `POST /webhooks/shopify/draft_orders/update`
pub async fn draft_orders_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    receive(&state, WebhookTopic::DraftOrderUpdate, &headers, &body).await
}

/// `POST /webhooks/shopify/draft_orders/delete`
pub async fn draft_orders_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    receive(&state, WebhookTopic::DraftOrderDelete, &headers, &body).await
}
