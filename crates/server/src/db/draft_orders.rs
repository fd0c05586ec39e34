//! Draft order repository for database operations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use draftline_core::{
    AddressId, CustomerId, DraftOrderId, DraftOrderTagId, LineItemSnapshot, ShippingLineSnapshot,
    ShopifyGid,
};

use super::addresses::{ADDRESS_COLUMNS, AddressColumns, delete_address, upsert_address};
use super::{DraftOrderStore, RepositoryError, stored_gid};
use crate::models::{CustomerSummary, DraftOrder, DraftOrderRecord, DraftOrderTag};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for draft order queries joined with customer and address.
#[derive(Debug, sqlx::FromRow)]
struct DraftOrderRow {
    id: Uuid,
    external_id: String,
    name: Option<String>,
    note: Option<String>,
    customer_external_id: Option<String>,
    shipping_line: Option<serde_json::Value>,
    line_items: serde_json::Value,
    status: Option<String>,
    invoice_url: Option<String>,
    upstream_created_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_synced_at: Option<DateTime<Utc>>,
    cust_id: Option<Uuid>,
    cust_external_id: Option<String>,
    cust_first_name: Option<String>,
    cust_last_name: Option<String>,
    cust_email: Option<String>,
    #[sqlx(flatten)]
    address: AddressColumns,
}

impl DraftOrderRow {
    fn into_draft_order(self, tags: Vec<DraftOrderTag>) -> Result<DraftOrder, RepositoryError> {
        let line_items: Vec<LineItemSnapshot> = serde_json::from_value(self.line_items)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid line items: {e}")))?;

        let shipping_line: Option<ShippingLineSnapshot> = self
            .shipping_line
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid shipping line: {e}")))?;

        let customer = match (self.cust_id, self.cust_external_id) {
            (Some(id), Some(external_id)) => Some(CustomerSummary {
                id: CustomerId::new(id),
                external_id: stored_gid(&external_id)?,
                first_name: self.cust_first_name,
                last_name: self.cust_last_name,
                email: self.cust_email,
            }),
            _ => None,
        };

        Ok(DraftOrder {
            id: DraftOrderId::new(self.id),
            external_id: stored_gid(&self.external_id)?,
            name: self.name,
            note: self.note,
            customer,
            customer_external_id: self
                .customer_external_id
                .as_deref()
                .map(stored_gid)
                .transpose()?,
            shipping_address: self.address.into_address(),
            shipping_line,
            line_items,
            status: self.status,
            invoice_url: self.invoice_url,
            tags,
            upstream_created_at: self.upstream_created_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_synced_at: self.last_synced_at,
        })
    }
}

/// Internal row type for draft order tag queries.
#[derive(Debug, sqlx::FromRow)]
struct TagRow {
    draft_order_id: Uuid,
    id: Uuid,
    tag: String,
    created_at: DateTime<Utc>,
}

fn draft_order_select(filter: &str) -> String {
    format!(
        r"
        SELECT d.id, d.external_id, d.name, d.note, d.customer_external_id,
               d.shipping_line, d.line_items, d.status, d.invoice_url,
               d.upstream_created_at, d.completed_at, d.created_at, d.updated_at,
               d.last_synced_at,
               cust.id AS cust_id, cust.external_id AS cust_external_id,
               cust.first_name AS cust_first_name, cust.last_name AS cust_last_name,
               cust.email AS cust_email,
               {ADDRESS_COLUMNS}
        FROM draftline.draft_orders d
        LEFT JOIN draftline.customers cust ON cust.id = d.customer_id
        LEFT JOIN draftline.addresses a ON a.id = d.shipping_address_id
        LEFT JOIN draftline.countries ctry ON ctry.id = a.country_id
        {filter}
        "
    )
}

const NEWEST_FIRST: &str = "ORDER BY d.upstream_created_at DESC NULLS LAST, d.created_at DESC";

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed draft order store.
#[derive(Clone)]
pub struct DraftOrderRepository {
    pool: PgPool,
}

impl DraftOrderRepository {
    /// Create a new draft order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load tags for a batch of rows and assemble the entities.
    async fn with_tags(&self, rows: Vec<DraftOrderRow>) -> Result<Vec<DraftOrder>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let tag_rows = sqlx::query_as::<_, TagRow>(
            r"
            SELECT draft_order_id, id, tag, created_at
            FROM draftline.draft_order_tags
            WHERE draft_order_id = ANY($1)
            ORDER BY tag
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<Uuid, Vec<DraftOrderTag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.draft_order_id).or_default().push(DraftOrderTag {
                id: DraftOrderTagId::new(row.id),
                tag: row.tag,
                created_at: row.created_at,
            });
        }

        rows.into_iter()
            .map(|row| {
                let row_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_draft_order(row_tags)
            })
            .collect()
    }
}

#[async_trait]
impl DraftOrderStore for DraftOrderRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<DraftOrder>, RepositoryError> {
        let sql = draft_order_select(NEWEST_FIRST);
        let rows = sqlx::query_as::<_, DraftOrderRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.with_tags(rows).await
    }

    #[instrument(skip(self), fields(external_id = %external_id))]
    async fn find_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<Option<DraftOrder>, RepositoryError> {
        let sql = draft_order_select("WHERE d.external_id = $1");
        let row = sqlx::query_as::<_, DraftOrderRow>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(self.with_tags(row.into_iter().collect()).await?.pop())
    }

    #[instrument(skip(self), fields(customer = %customer_external_id))]
    async fn find_by_customer(
        &self,
        customer_external_id: &ShopifyGid,
    ) -> Result<Vec<DraftOrder>, RepositoryError> {
        let sql = draft_order_select(&format!("WHERE d.customer_external_id = $1 {NEWEST_FIRST}"));
        let rows = sqlx::query_as::<_, DraftOrderRow>(&sql)
            .bind(customer_external_id)
            .fetch_all(&self.pool)
            .await?;

        self.with_tags(rows).await
    }

    /// Upsert keyed on the external ID.
    ///
    /// The customer link is resolved against the cache at write time; the
    /// upstream customer GID is kept regardless. Tags absent from the record
    /// are removed and new ones attached, so the stored set equals the record's.
    #[instrument(skip(self, record), fields(external_id = %record.external_id))]
    async fn upsert_from_upstream(
        &self,
        record: &DraftOrderRecord,
    ) -> Result<DraftOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer_id: Option<Uuid> = match &record.customer_external_id {
            Some(gid) => {
                sqlx::query_scalar("SELECT id FROM draftline.customers WHERE external_id = $1")
                    .bind(gid)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        // Claim the row so concurrent first-time upserts queue on its lock
        sqlx::query(
            r"
            INSERT INTO draftline.draft_orders (external_id)
            VALUES ($1)
            ON CONFLICT (external_id) DO NOTHING
            ",
        )
        .bind(&record.external_id)
        .execute(&mut *tx)
        .await?;

        let existing_address: Option<AddressId> = sqlx::query_scalar::<_, Option<Uuid>>(
            r"
            SELECT shipping_address_id FROM draftline.draft_orders
            WHERE external_id = $1
            FOR UPDATE
            ",
        )
        .bind(&record.external_id)
        .fetch_optional(&mut *tx)
        .await?
        .flatten()
        .map(AddressId::new);

        let address_id = match &record.shipping_address {
            Some(address) => Some(upsert_address(&mut tx, existing_address, address).await?),
            None => None,
        };

        let draft_order_id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO draftline.draft_orders (
                external_id, name, note, customer_id, customer_external_id,
                shipping_address_id, shipping_line, line_items, status, invoice_url,
                upstream_created_at, completed_at, last_synced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            ON CONFLICT (external_id) DO UPDATE
            SET name = EXCLUDED.name,
                note = EXCLUDED.note,
                customer_id = EXCLUDED.customer_id,
                customer_external_id = EXCLUDED.customer_external_id,
                shipping_address_id = EXCLUDED.shipping_address_id,
                shipping_line = EXCLUDED.shipping_line,
                line_items = EXCLUDED.line_items,
                status = EXCLUDED.status,
                invoice_url = EXCLUDED.invoice_url,
                upstream_created_at = EXCLUDED.upstream_created_at,
                completed_at = EXCLUDED.completed_at,
                updated_at = NOW(),
                last_synced_at = NOW()
            RETURNING id
            ",
        )
        .bind(&record.external_id)
        .bind(record.name.as_deref())
        .bind(record.note.as_deref())
        .bind(customer_id)
        .bind(record.customer_external_id.as_ref())
        .bind(address_id)
        .bind(record.shipping_line.as_ref().map(Json))
        .bind(Json(&record.line_items))
        .bind(record.status.as_deref())
        .bind(record.invoice_url.as_deref())
        .bind(record.created_at)
        .bind(record.completed_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            DELETE FROM draftline.draft_order_tags
            WHERE draft_order_id = $1 AND NOT (tag = ANY($2))
            ",
        )
        .bind(draft_order_id)
        .bind(&record.tags)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO draftline.draft_order_tags (draft_order_id, tag)
            SELECT $1, UNNEST($2::text[])
            ON CONFLICT (draft_order_id, tag) DO NOTHING
            ",
        )
        .bind(draft_order_id)
        .bind(&record.tags)
        .execute(&mut *tx)
        .await?;

        if let (Some(old), None) = (existing_address, address_id) {
            delete_address(&mut tx, old).await?;
        }

        tx.commit().await?;

        self.find_by_external_id(&record.external_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    #[instrument(skip(self), fields(external_id = %external_id))]
    async fn add_tag(&self, external_id: &ShopifyGid, tag: &str) -> Result<bool, RepositoryError> {
        let draft_order_id: Uuid =
            sqlx::query_scalar("SELECT id FROM draftline.draft_orders WHERE external_id = $1")
                .bind(external_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let result = sqlx::query(
            r"
            INSERT INTO draftline.draft_order_tags (draft_order_id, tag)
            VALUES ($1, $2)
            ON CONFLICT (draft_order_id, tag) DO NOTHING
            ",
        )
        .bind(draft_order_id)
        .bind(tag)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(external_id = %external_id))]
    async fn delete_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<Option<Uuid>> = sqlx::query_scalar(
            r"
            DELETE FROM draftline.draft_orders
            WHERE external_id = $1
            RETURNING shipping_address_id
            ",
        )
        .bind(external_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(address_id) = deleted else {
            tx.rollback().await?;
            return Ok(false);
        };

        if let Some(address_id) = address_id {
            delete_address(&mut tx, AddressId::new(address_id)).await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
