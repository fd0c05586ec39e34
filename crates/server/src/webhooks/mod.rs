//! Webhook ingestion: verified, incremental upserts from Shopify events.
//!
//! Every delivery is answered `200 OK` by the route layer; the outcome of
//! processing is only logged. Signature failures never touch the store.

pub mod payloads;

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, error, info, instrument, warn};

use crate::db::{CustomerStore, DraftOrderStore};

use payloads::{CustomerPayload, DeletePayload, DraftOrderPayload, external_id, unwrap_envelope};

use draftline_core::ShopifyGid;

/// Header carrying the base64 HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "X-Shopify-Hmac-Sha256";

type HmacSha256 = Hmac<Sha256>;

/// Webhook topics Draftline subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookTopic {
    /// `customers/update`
    CustomerUpdate,
    /// `draft_orders/create`
    DraftOrderCreate,
    /// `draft_orders/update`
    DraftOrderUpdate,
    /// `draft_orders/delete`
    DraftOrderDelete,
}

impl WebhookTopic {
    /// Shopify topic name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomerUpdate => "customers/update",
            Self::DraftOrderCreate => "draft_orders/create",
            Self::DraftOrderUpdate => "draft_orders/update",
            Self::DraftOrderDelete => "draft_orders/delete",
        }
    }
}

/// What processing a delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The entity was upserted.
    Applied(ShopifyGid),
    /// The entity was removed (or was already absent).
    Deleted(ShopifyGid),
    /// Missing or mismatched signature; nothing was read.
    Rejected,
    /// Verified but unusable (bad JSON, no id).
    Ignored,
    /// Verified and parsed, but the store write failed.
    Failed,
}

/// Compute the base64 HMAC-SHA256 Shopify sends for `body`.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

/// Verify a webhook signature in constant time.
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Applies verified webhook deliveries to the store.
#[derive(Clone)]
pub struct WebhookService {
    customers: Arc<dyn CustomerStore>,
    draft_orders: Arc<dyn DraftOrderStore>,
    secret: SecretString,
}

impl WebhookService {
    /// Create a new webhook service.
    #[must_use]
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        draft_orders: Arc<dyn DraftOrderStore>,
        secret: SecretString,
    ) -> Self {
        Self {
            customers,
            draft_orders,
            secret,
        }
    }

    /// Verify, parse and apply one delivery.
    #[instrument(skip(self, signature, body), fields(topic = topic.as_str(), bytes = body.len()))]
    pub async fn handle(
        &self,
        topic: WebhookTopic,
        signature: Option<&str>,
        body: &[u8],
    ) -> WebhookOutcome {
        let Some(signature) = signature else {
            warn!("Webhook missing signature header");
            return WebhookOutcome::Rejected;
        };

        if !verify_signature(self.secret.expose_secret(), body, signature) {
            warn!("Webhook signature mismatch");
            return WebhookOutcome::Rejected;
        }

        debug!("Webhook signature verified");

        let outcome = match topic {
            WebhookTopic::CustomerUpdate => self.customer_update(body).await,
            WebhookTopic::DraftOrderCreate | WebhookTopic::DraftOrderUpdate => {
                self.draft_order_upsert(body).await
            }
            WebhookTopic::DraftOrderDelete => self.draft_order_delete(body).await,
        };

        info!(outcome = ?outcome, "Webhook processed");
        outcome
    }

    async fn customer_update(&self, body: &[u8]) -> WebhookOutcome {
        let Some(record) =
            parse::<CustomerPayload>(body, "customer").and_then(CustomerPayload::into_record)
        else {
            return WebhookOutcome::Ignored;
        };

        match self.customers.upsert_from_upstream(&record).await {
            Ok(_) => WebhookOutcome::Applied(record.external_id),
            Err(e) => {
                error!(external_id = %record.external_id, error = %e, "Failed to upsert customer");
                WebhookOutcome::Failed
            }
        }
    }

    async fn draft_order_upsert(&self, body: &[u8]) -> WebhookOutcome {
        let Some(record) = parse::<DraftOrderPayload>(body, "draft_order")
            .and_then(DraftOrderPayload::into_record)
        else {
            return WebhookOutcome::Ignored;
        };

        match self.draft_orders.upsert_from_upstream(&record).await {
            Ok(_) => WebhookOutcome::Applied(record.external_id),
            Err(e) => {
                error!(external_id = %record.external_id, error = %e, "Failed to upsert draft order");
                WebhookOutcome::Failed
            }
        }
    }

    async fn draft_order_delete(&self, body: &[u8]) -> WebhookOutcome {
        let Some(gid) = parse::<DeletePayload>(body, "draft_order").and_then(|p| {
            external_id(
                ShopifyGid::DRAFT_ORDER,
                p.admin_graphql_api_id.as_deref(),
                p.id.as_ref(),
            )
        }) else {
            return WebhookOutcome::Ignored;
        };

        match self.draft_orders.delete_by_external_id(&gid).await {
            Ok(removed) => {
                debug!(external_id = %gid, removed, "Draft order delete applied");
                WebhookOutcome::Deleted(gid)
            }
            Err(e) => {
                error!(external_id = %gid, error = %e, "Failed to delete draft order");
                WebhookOutcome::Failed
            }
        }
    }
}

/// Parse a body, unwrapping an optional `{"<envelope>": ...}` wrapper.
fn parse<T: DeserializeOwned>(body: &[u8], envelope: &str) -> Option<T> {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Webhook body is not JSON");
            return None;
        }
    };

    match serde_json::from_value(unwrap_envelope(value, envelope)) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(error = %e, "Webhook payload has unexpected shape");
            None
        }
    }
}
