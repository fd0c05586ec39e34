//! Tag handling shared by customers and draft orders.
//!
//! Shopify hands out tags in two shapes: GraphQL returns a list, REST and
//! webhook payloads return a single comma-separated string. Both normalise
//! to the same trimmed, de-duplicated list.

use serde::{Deserialize, Serialize};

/// Split a comma-separated tag string into a normalised list.
///
/// ```
/// use draftline_core::parse_tags;
///
/// assert_eq!(parse_tags("wholesale, net30,,wholesale"), vec!["wholesale", "net30"]);
/// assert!(parse_tags("").is_empty());
/// ```
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

/// Trim, drop empties and de-duplicate tags, keeping first-seen order.
#[must_use]
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Derive a customer's price tier from their tags.
///
/// The storefront convention is that the first tag on a customer names their
/// price tier (e.g. `Tier 2`).
#[must_use]
pub fn derive_price_tier(tags: &[String]) -> Option<String> {
    tags.first()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

/// Include/exclude filter over a tag list.
///
/// An entity passes when it carries at least one of the `include` tags (or
/// `include` is empty) and none of the `exclude` tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    /// Keep entities carrying any of these tags.
    #[serde(default)]
    pub include: Vec<String>,
    /// Drop entities carrying any of these tags.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TagFilter {
    /// Build a filter from optional comma-separated query parameters.
    #[must_use]
    pub fn from_params(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include: include.map(parse_tags).unwrap_or_default(),
            exclude: exclude.map(parse_tags).unwrap_or_default(),
        }
    }

    /// Returns `true` if the filter has no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Check a tag list against the filter.
    #[must_use]
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        let has = |wanted: &String| tags.iter().any(|t| t.as_ref() == wanted);

        if !self.include.is_empty() && !self.include.iter().any(has) {
            return false;
        }
        !self.exclude.iter().any(has)
    }
}
