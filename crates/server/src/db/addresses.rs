//! Shared helpers for the rows customers and draft orders hang off:
//! addresses, countries and companies.
//!
//! All helpers take a connection rather than the pool so they run inside the
//! caller's transaction.

use sqlx::PgConnection;
use uuid::Uuid;

use draftline_core::{AddressId, CompanyId, CountryId};

use super::RepositoryError;
use crate::models::{Address, AddressRecord, Country};

/// Address and country columns selected by the customer and draft order joins.
///
/// Joins must alias the address table `a` and the country table `ctry`.
pub(super) const ADDRESS_COLUMNS: &str = "a.id AS address_id, a.address1, a.address2, a.city, \
     a.province, a.zip, ctry.id AS country_id, ctry.code AS country_code, \
     ctry.name AS country_name";

/// Flattened address columns of a joined row.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct AddressColumns {
    address_id: Option<Uuid>,
    address1: Option<String>,
    address2: Option<String>,
    city: Option<String>,
    province: Option<String>,
    zip: Option<String>,
    country_id: Option<Uuid>,
    country_code: Option<String>,
    country_name: Option<String>,
}

impl AddressColumns {
    /// The joined address, or `None` when the left join found nothing.
    pub(super) fn into_address(self) -> Option<Address> {
        let id = self.address_id?;

        let country = match (self.country_id, self.country_code, self.country_name) {
            (Some(id), Some(code), Some(name)) => Some(Country {
                id: CountryId::new(id),
                code,
                name,
            }),
            _ => None,
        };

        Some(Address {
            id: AddressId::new(id),
            address1: self.address1,
            address2: self.address2,
            city: self.city,
            province: self.province,
            zip: self.zip,
            country,
        })
    }
}

/// Insert or update a country keyed on its code.
///
/// A missing name falls back to the code on insert and never replaces a
/// recorded name.
pub(super) async fn upsert_country(
    conn: &mut PgConnection,
    code: &str,
    name: Option<&str>,
) -> Result<CountryId, RepositoryError> {
    let id: Uuid = sqlx::query_scalar(
        r"
        INSERT INTO draftline.countries (code, name)
        VALUES ($1, COALESCE($2::text, $1))
        ON CONFLICT (code) DO UPDATE
        SET name = COALESCE($2::text, draftline.countries.name)
        RETURNING id
        ",
    )
    .bind(code)
    .bind(name)
    .fetch_one(conn)
    .await?;

    Ok(CountryId::new(id))
}

/// Insert or update a company keyed on its name.
///
/// A missing price tier never clears one already recorded.
pub(super) async fn upsert_company(
    conn: &mut PgConnection,
    name: &str,
    price_tier: Option<&str>,
) -> Result<CompanyId, RepositoryError> {
    let id: Uuid = sqlx::query_scalar(
        r"
        INSERT INTO draftline.companies (name, price_tier)
        VALUES ($1, $2)
        ON CONFLICT (name) DO UPDATE
        SET price_tier = COALESCE(EXCLUDED.price_tier, draftline.companies.price_tier),
            updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(name)
    .bind(price_tier)
    .fetch_one(conn)
    .await?;

    Ok(CompanyId::new(id))
}

/// Write an address, reusing `existing` in place when the owner already has one.
pub(super) async fn upsert_address(
    conn: &mut PgConnection,
    existing: Option<AddressId>,
    record: &AddressRecord,
) -> Result<AddressId, RepositoryError> {
    let country_id = match record.country_parts() {
        Some((code, name)) => Some(upsert_country(&mut *conn, &code, name.as_deref()).await?),
        None => None,
    };

    if let Some(existing) = existing {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r"
            UPDATE draftline.addresses
            SET address1 = $2, address2 = $3, city = $4, province = $5, zip = $6,
                country_id = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(existing)
        .bind(record.address1.as_deref())
        .bind(record.address2.as_deref())
        .bind(record.city.as_deref())
        .bind(record.province.as_deref())
        .bind(record.zip.as_deref())
        .bind(country_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(id) = updated {
            return Ok(AddressId::new(id));
        }
    }

    let id: Uuid = sqlx::query_scalar(
        r"
        INSERT INTO draftline.addresses (address1, address2, city, province, zip, country_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        ",
    )
    .bind(record.address1.as_deref())
    .bind(record.address2.as_deref())
    .bind(record.city.as_deref())
    .bind(record.province.as_deref())
    .bind(record.zip.as_deref())
    .bind(country_id)
    .fetch_one(conn)
    .await?;

    Ok(AddressId::new(id))
}

/// Remove an address no longer referenced by its owner.
pub(super) async fn delete_address(
    conn: &mut PgConnection,
    id: AddressId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM draftline.addresses WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
