//! Shopmate server library.
//!
//! Conversational shopping assistant backend: an LLM agent with three
//! transactional tools over `PostgreSQL` stores, exposed as a small JSON
//! API. The binary in `main.rs` wires these modules together.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod agent;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
