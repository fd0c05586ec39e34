//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                             - Liveness
//! GET  /health/ready                       - Readiness (checks the store)
//!
//! # Customers
//! GET  /api/customers                      - All customers (cache-first)
//! GET  /api/customers/companies            - Customers with company and tier
//! GET  /api/customers/{id}                 - One customer by GID or numeric ID
//! GET  /api/customers/{id}/draft-orders    - A customer's draft orders
//!                                            (?include_tags=a,b&exclude_tags=c)
//! GET  /api/companies/price-tiers          - Company name to price tier
//!
//! # Draft Orders
//! GET  /api/draft-orders                   - All draft orders (cache-first)
//! GET  /api/draft-orders/{id}              - One draft order
//! POST /api/draft-orders/{id}/tags         - Add a tag ({"tag": "..."})
//!
//! # Webhooks (HMAC verified, always 200)
//! POST /webhooks/shopify/customers/update
//! POST /webhooks/shopify/draft_orders/create
//! POST /webhooks/shopify/draft_orders/update
//! POST /webhooks/shopify/draft_orders/delete
//! ```

pub mod customers;
pub mod draft_orders;
pub mod webhooks;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// JSON read API.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(customers::index))
        .route("/customers/companies", get(customers::companies))
        .route("/customers/{id}", get(customers::show))
        .route("/customers/{id}/draft-orders", get(customers::draft_orders))
        .route("/companies/price-tiers", get(customers::price_tiers))
        .route("/draft-orders", get(draft_orders::index))
        .route("/draft-orders/{id}", get(draft_orders::show))
        .route("/draft-orders/{id}/tags", post(draft_orders::add_tag))
}

/// Shopify webhook receivers.
///
/// No body limit: an oversized delivery must still be acknowledged with 200.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/customers/update", post(webhooks::customers_update))
        .route("/draft_orders/create", post(webhooks::draft_orders_create))
        .route("/draft_orders/update", post(webhooks::draft_orders_update))
        .route("/draft_orders/delete", post(webhooks::draft_orders_delete))
        .layer(DefaultBodyLimit::disable())
}

/// The full application router with request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .nest("/webhooks/shopify", webhook_routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity when the cache is backed by Postgres.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
