//! Shopify global ID type.
//!
//! Every customer and draft order cached by Draftline is keyed by the GID the
//! upstream platform assigned to it (`gid://shopify/Customer/123`). The GID is
//! the sole conflict key for upserts, so it is normalised here once.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopifyGid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    /// The input string is empty.
    #[error("gid cannot be empty")]
    Empty,
    /// The input is neither a `gid://shopify/...` string nor a numeric ID.
    #[error("malformed gid: {0}")]
    Malformed(String),
    /// The GID names a different resource than the caller expected.
    #[error("expected a {expected} gid, got {found}")]
    WrongResource {
        /// Resource the caller asked for.
        expected: String,
        /// Resource found in the input.
        found: String,
    },
}

/// A Shopify global ID (`gid://shopify/<Resource>/<id>`).
///
/// ## Examples
///
/// ```
/// use draftline_core::ShopifyGid;
///
/// let gid = ShopifyGid::parse("gid://shopify/Customer/42").unwrap();
/// assert_eq!(gid.resource(), "Customer");
/// assert_eq!(gid.legacy_id(), "42");
///
/// // Bare numeric IDs are accepted when the resource is known
/// let gid = ShopifyGid::customer("42").unwrap();
/// assert_eq!(gid.as_str(), "gid://shopify/Customer/42");
///
/// assert!(ShopifyGid::parse("not-a-gid").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopifyGid(String);

impl ShopifyGid {
    /// Scheme and namespace shared by every Shopify GID.
    pub const PREFIX: &'static str = "gid://shopify/";

    /// Resource name for customers.
    pub const CUSTOMER: &'static str = "Customer";

    /// Resource name for draft orders.
    pub const DRAFT_ORDER: &'static str = "DraftOrder";

    /// Parse a full GID string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, lacks the `gid://shopify/`
    /// prefix, or is missing the resource or ID segment.
    pub fn parse(s: &str) -> Result<Self, GidError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GidError::Empty);
        }

        let rest = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| GidError::Malformed(s.to_string()))?;

        let (resource, id) = rest
            .split_once('/')
            .ok_or_else(|| GidError::Malformed(s.to_string()))?;

        if resource.is_empty()
            || !resource.chars().all(|c| c.is_ascii_alphanumeric())
            || id.is_empty()
            || id.contains('/')
        {
            return Err(GidError::Malformed(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// Parse either a full GID or a bare numeric ID for a known resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed or names another resource.
    pub fn for_resource(resource: &str, raw: &str) -> Result<Self, GidError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(GidError::Empty);
        }

        if raw.starts_with(Self::PREFIX) {
            let gid = Self::parse(raw)?;
            if gid.resource() != resource {
                return Err(GidError::WrongResource {
                    expected: resource.to_string(),
                    found: gid.resource().to_string(),
                });
            }
            return Ok(gid);
        }

        if raw.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self(format!("{}{resource}/{raw}", Self::PREFIX)));
        }

        Err(GidError::Malformed(raw.to_string()))
    }

    /// Build a GID from a numeric REST ID.
    #[must_use]
    pub fn from_numeric(resource: &str, id: u64) -> Self {
        Self(format!("{}{resource}/{id}", Self::PREFIX))
    }

    /// Parse a customer GID or bare customer ID.
    ///
    /// # Errors
    ///
    /// See [`ShopifyGid::for_resource`].
    pub fn customer(raw: &str) -> Result<Self, GidError> {
        Self::for_resource(Self::CUSTOMER, raw)
    }

    /// Parse a draft order GID or bare draft order ID.
    ///
    /// # Errors
    ///
    /// See [`ShopifyGid::for_resource`].
    pub fn draft_order(raw: &str) -> Result<Self, GidError> {
        Self::for_resource(Self::DRAFT_ORDER, raw)
    }

    /// Returns the GID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the GID and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the resource segment (e.g. `Customer`).
    #[must_use]
    pub fn resource(&self) -> &str {
        self.segments().0
    }

    /// Returns the legacy (REST) ID, without any query suffix.
    #[must_use]
    pub fn legacy_id(&self) -> &str {
        let id = self.segments().1;
        id.split_once('?').map_or(id, |(id, _)| id)
    }

    fn segments(&self) -> (&str, &str) {
        self.0
            .strip_prefix(Self::PREFIX)
            .and_then(|rest| rest.split_once('/'))
            .unwrap_or(("", ""))
    }
}

impl fmt::Display for ShopifyGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopifyGid {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopifyGid {
    type Error = GidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopifyGid> for String {
    fn from(gid: ShopifyGid) -> Self {
        gid.0
    }
}

impl AsRef<str> for ShopifyGid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopifyGid {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopifyGid {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopifyGid {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let gid = ShopifyGid::parse("gid://shopify/DraftOrder/1001").unwrap();
        assert_eq!(gid.resource(), "DraftOrder");
        assert_eq!(gid.legacy_id(), "1001");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let gid = ShopifyGid::parse("  gid://shopify/Customer/7 ").unwrap();
        assert_eq!(gid.as_str(), "gid://shopify/Customer/7");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopifyGid::parse(""), Err(GidError::Empty));
        assert_eq!(ShopifyGid::parse("   "), Err(GidError::Empty));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            ShopifyGid::parse("gid://shopify/Customer"),
            Err(GidError::Malformed(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://shopify//12"),
            Err(GidError::Malformed(_))
        ));
        assert!(matches!(
            ShopifyGid::parse("gid://other/Customer/12"),
            Err(GidError::Malformed(_))
        ));
    }

    #[test]
    fn test_legacy_id_strips_query() {
        let gid = ShopifyGid::parse("gid://shopify/DraftOrder/55?key=abc").unwrap();
        assert_eq!(gid.legacy_id(), "55");
    }

    #[test]
    fn test_for_resource_numeric() {
        let gid = ShopifyGid::customer("123").unwrap();
        assert_eq!(gid.as_str(), "gid://shopify/Customer/123");
    }

    #[test]
    fn test_for_resource_wrong_resource() {
        let err = ShopifyGid::draft_order("gid://shopify/Customer/1").unwrap_err();
        assert_eq!(
            err,
            GidError::WrongResource {
                expected: "DraftOrder".to_string(),
                found: "Customer".to_string(),
            }
        );
    }

    #[test]
    fn test_for_resource_rejects_garbage() {
        assert!(matches!(
            ShopifyGid::customer("abc"),
            Err(GidError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_numeric() {
        let gid = ShopifyGid::from_numeric(ShopifyGid::DRAFT_ORDER, 987);
        assert_eq!(gid.as_str(), "gid://shopify/DraftOrder/987");
    }

    #[test]
    fn test_serde_validates() {
        let gid: ShopifyGid = serde_json::from_str("\"gid://shopify/Customer/9\"").unwrap();
        assert_eq!(gid.legacy_id(), "9");
        assert_eq!(serde_json::to_string(&gid).unwrap(), "\"gid://shopify/Customer/9\"");

        assert!(serde_json::from_str::<ShopifyGid>("\"9\"").is_err());
    }
}
