//! Storage layer for the storefront API.
//!
//! Provides database access via SQLx with SQLite.

mod models;
mod query;
mod repository;
mod seed;

pub use repository::{ShippingMethodRepository, StoreRepository};
pub use seed::seed_demo_data;
