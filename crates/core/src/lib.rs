//! Minimart Core - Shared domain types.
//!
//! This crate provides common types used across all Minimart components:
//! - `api` - HTTP server exposing accounts, the catalog, carts, and orders
//! - `integration-tests` - End-to-end tests against the in-process router
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, usernames, and order
//!   statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
