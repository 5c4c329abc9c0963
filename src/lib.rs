//! Medimart — medicine marketplace API
//!
//! Catalog browsing and user management live in sibling services; this crate
//! owns the order placement and inventory-consistency core:
//! - Cart staging and snapshot reads
//! - Checkout: validate, price, persist, reserve stock, clear cart — one
//!   transaction
//! - The order status state machine, with stock restoration on cancellation
//! - Payment status tracking

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod service;
pub mod store;
