//! Address and country models.

use serde::{Deserialize, Serialize};

use draftline_core::{AddressId, CountryId};

/// An address as reported by the upstream platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// First line of the address.
    pub address1: Option<String>,
    /// Second line of the address.
    pub address2: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Province or state.
    pub province: Option<String>,
    /// Postal/ZIP code.
    pub zip: Option<String>,
    /// Country code (ISO 3166-1 alpha-2). Countries are keyed on this.
    pub country_code: Option<String>,
    /// Country display name.
    pub country_name: Option<String>,
}

impl AddressRecord {
    /// Country code and display name, if the address names a country.
    ///
    /// Falls back to the code as the display name when upstream omitted it.
    #[must_use]
    pub fn country(&self) -> Option<(String, String)> {
        let (code, name) = self.country_parts()?;
        let name = name.unwrap_or_else(|| code.clone());
        Some((code, name))
    }

    /// Normalised country code and the display name only if upstream sent one.
    ///
    /// Stores use this so a nameless address never overwrites a known name.
    #[must_use]
    pub fn country_parts(&self) -> Option<(String, Option<String>)> {
        let code = self
            .country_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())?
            .to_uppercase();
        let name = self
            .country_name
            .clone()
            .filter(|n| !n.trim().is_empty());
        Some((code, name))
    }
}

/// A cached country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Row ID.
    pub id: CountryId,
    /// Country code (unique).
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A cached address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Row ID.
    pub id: AddressId,
    /// First line of the address.
    pub address1: Option<String>,
    /// Second line of the address.
    pub address2: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Province or state.
    pub province: Option<String>,
    /// Postal/ZIP code.
    pub zip: Option<String>,
    /// Country, if known.
    pub country: Option<Country>,
}
