//! Draftline server library.
//!
//! A cache-first backend-for-frontend over the Shopify Admin API. Customer
//! and draft order reads are served from a local store, kept fresh by
//! backfills and webhooks, with the Admin API as the fallback on a miss.
//!
//! # Security
//!
//! This crate holds HIGH PRIVILEGE credentials:
//! - Shopify Admin API access token (customer PII, draft order writes)
//! - Webhook signing secret
//!
//! Both are `SecretString`s and never logged.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod sync;
pub mod webhooks;

#[cfg(test)]
mod test_support;
