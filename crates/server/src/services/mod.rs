//! Read-side services.
//!
//! - [`QueryService`] - cache-first reads with upstream fallback
//! - [`views`] - the JSON shapes both paths produce

mod query;
pub mod views;

pub use query::{FALLBACK_PAGE_SIZE, QueryService};

use thiserror::Error;

/// Errors returned by the query service.
///
/// Upstream causes are logged where they happen; only a generic message
/// travels further.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The upstream platform failed.
    #[error("{0}")]
    Upstream(&'static str),

    /// The ID is neither a GID of the right resource nor a numeric ID.
    #[error("Invalid ID: {0}")]
    InvalidId(String),

    /// Tags must be non-empty and free of commas.
    #[error("Invalid tag: {0:?}")]
    InvalidTag(String),

    /// Upstream has no such resource.
    #[error("Not found: {0}")]
    NotFound(String),
}
