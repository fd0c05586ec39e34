//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BffConfig;
use crate::db::{CustomerRepository, CustomerStore, DraftOrderRepository, DraftOrderStore, MemoryStore};
use crate::services::QueryService;
use crate::shopify::{AdminClient, CommerceUpstream};
use crate::webhooks::WebhookService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: Option<PgPool>,
    query: QueryService,
    webhooks: WebhookService,
}

impl AppState {
    /// Wire the store, upstream client and services from configuration.
    ///
    /// With a pool, the Postgres repositories back the cache; without one, a
    /// process-local [`MemoryStore`] does.
    #[must_use]
    pub fn new(config: &BffConfig, pool: Option<PgPool>) -> Self {
        let customers: Arc<dyn CustomerStore>;
        let draft_orders: Arc<dyn DraftOrderStore>;
        if let Some(pool) = &pool {
            customers = Arc::new(CustomerRepository::new(pool.clone()));
            draft_orders = Arc::new(DraftOrderRepository::new(pool.clone()));
        } else {
            let store = Arc::new(MemoryStore::new());
            customers = store.clone();
            draft_orders = store;
        }
        let upstream: Arc<dyn CommerceUpstream> = Arc::new(AdminClient::new(&config.shopify));

        let query = QueryService::new(customers.clone(), draft_orders.clone(), upstream);
        let webhooks = WebhookService::new(
            customers,
            draft_orders,
            config.shopify.webhook_secret.clone(),
        );

        Self::from_parts(pool, query, webhooks)
    }

    /// Assemble state from already-built services.
    #[must_use]
    pub fn from_parts(pool: Option<PgPool>, query: QueryService, webhooks: WebhookService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                query,
                webhooks,
            }),
        }
    }

    /// The database pool, if the cache is backed by Postgres.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// The cache-first read service.
    #[must_use]
    pub fn query(&self) -> &QueryService {
        &self.inner.query
    }

    /// The webhook ingestion service.
    #[must_use]
    pub fn webhooks(&self) -> &WebhookService {
        &self.inner.webhooks
    }
}
