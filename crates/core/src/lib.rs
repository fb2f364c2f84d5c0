//! Shopmate Core - Shared types library.
//!
//! This crate provides common types used across the Shopmate components:
//! - `server` - Chat backend (HTTP API, stores, order workflow)
//! - `integration-tests` - Cross-crate test suite
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and the order status enum

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
