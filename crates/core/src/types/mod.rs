//! Core types for Draftline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod gid;
pub mod id;
pub mod snapshot;
pub mod tags;

pub use gid::{GidError, ShopifyGid};
pub use id::*;
pub use snapshot::{AppliedDiscount, LineItemSnapshot, ShippingLineSnapshot};
pub use tags::{TagFilter, derive_price_tier, normalize_tags, parse_tags};
