//! Customer repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use draftline_core::{AddressId, CompanyId, CustomerId, ShopifyGid};

use super::addresses::{
    ADDRESS_COLUMNS, AddressColumns, delete_address, upsert_address, upsert_company,
};
use super::{CustomerStore, RepositoryError, stored_gid};
use crate::models::{Company, Customer, CustomerRecord};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for customer queries joined with company and address.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    external_id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    price_tier: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_synced_at: Option<DateTime<Utc>>,
    company_id: Option<Uuid>,
    company_name: Option<String>,
    company_price_tier: Option<String>,
    #[sqlx(flatten)]
    address: AddressColumns,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let company = match (row.company_id, row.company_name) {
            (Some(id), Some(name)) => Some(Company {
                id: CompanyId::new(id),
                name,
                price_tier: row.company_price_tier,
            }),
            _ => None,
        };

        Ok(Self {
            id: CustomerId::new(row.id),
            external_id: stored_gid(&row.external_id)?,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            company,
            default_address: row.address.into_address(),
            price_tier: row.price_tier,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_synced_at: row.last_synced_at,
        })
    }
}

/// Internal row type for company queries.
#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    price_tier: Option<String>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: CompanyId::new(row.id),
            name: row.name,
            price_tier: row.price_tier,
        }
    }
}

fn customer_select(filter: &str) -> String {
    format!(
        r"
        SELECT c.id, c.external_id, c.first_name, c.last_name, c.email, c.price_tier, c.tags,
               c.created_at, c.updated_at, c.last_synced_at,
               co.id AS company_id, co.name AS company_name, co.price_tier AS company_price_tier,
               {ADDRESS_COLUMNS}
        FROM draftline.customers c
        LEFT JOIN draftline.companies co ON co.id = c.company_id
        LEFT JOIN draftline.addresses a ON a.id = c.default_address_id
        LEFT JOIN draftline.countries ctry ON ctry.id = a.country_id
        {filter}
        "
    )
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed customer store.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for CustomerRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Customer>, RepositoryError> {
        let sql = customer_select(
            "ORDER BY c.last_name NULLS LAST, c.first_name NULLS LAST, c.external_id",
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), fields(external_id = %external_id))]
    async fn find_by_external_id(
        &self,
        external_id: &ShopifyGid,
    ) -> Result<Option<Customer>, RepositoryError> {
        let sql = customer_select("WHERE c.external_id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Upsert keyed on the external ID.
    ///
    /// Company and country are upserted by their natural keys first; an
    /// existing default address row is updated in place so repeated syncs do
    /// not accumulate orphans.
    #[instrument(skip(self, record), fields(external_id = %record.external_id))]
    async fn upsert_from_upstream(
        &self,
        record: &CustomerRecord,
    ) -> Result<Customer, RepositoryError> {
        let price_tier = record.price_tier();
        let mut tx = self.pool.begin().await?;

        let company_id = match record.company_name() {
            Some(name) => Some(upsert_company(&mut tx, name, price_tier.as_deref()).await?),
            None => None,
        };

        // Claim the row so concurrent first-time upserts queue on its lock
        sqlx::query(
            r"
            INSERT INTO draftline.customers (external_id)
            VALUES ($1)
            ON CONFLICT (external_id) DO NOTHING
            ",
        )
        .bind(&record.external_id)
        .execute(&mut *tx)
        .await?;

        let existing_address: Option<AddressId> = sqlx::query_scalar::<_, Option<Uuid>>(
            r"
            SELECT default_address_id FROM draftline.customers
            WHERE external_id = $1
            FOR UPDATE
            ",
        )
        .bind(&record.external_id)
        .fetch_optional(&mut *tx)
        .await?
        .flatten()
        .map(AddressId::new);

        let address_id = match &record.default_address {
            Some(address) => Some(upsert_address(&mut tx, existing_address, address).await?),
            None => None,
        };

        sqlx::query(
            r"
            INSERT INTO draftline.customers (
                external_id, first_name, last_name, email, company_id,
                default_address_id, price_tier, tags, last_synced_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (external_id) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                company_id = EXCLUDED.company_id,
                default_address_id = EXCLUDED.default_address_id,
                price_tier = EXCLUDED.price_tier,
                tags = EXCLUDED.tags,
                updated_at = NOW(),
                last_synced_at = NOW()
            ",
        )
        .bind(&record.external_id)
        .bind(record.first_name.as_deref())
        .bind(record.last_name.as_deref())
        .bind(record.email.as_deref())
        .bind(company_id)
        .bind(address_id)
        .bind(price_tier.as_deref())
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

    #[instrument(skip(self))]
    async fn list_companies(&self) -> Result<Vec<Company>, RepositoryError> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r"
            SELECT id, name, price_tier
            FROM draftline.companies
            ORDER BY name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
