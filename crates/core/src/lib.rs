//! Draftline Core - Shared domain types.
//!
//! This crate provides the types shared by the Draftline components:
//! - `server` - Cache-first BFF over the Shopify Admin API
//! - `cli` - Command-line tools for migrations and backfills
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, Shopify GIDs, tag handling and cached snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
