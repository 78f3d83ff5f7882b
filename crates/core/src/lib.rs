//! Threadline Core - Shared domain types and rules.
//!
//! This crate provides the types used across all Threadline components:
//! - `storefront` - JSON API for the shop (catalog, accounts, cart, payments)
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Repositories load a record, apply one of these
//! rules, and write the result back, so the behaviour tested here is the
//! behaviour the API exhibits.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, prices, carts, favorites and products
//! - [`search`] - Exact-then-approximate product name matching

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod search;
pub mod types;

pub use types::*;
