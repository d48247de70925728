//! HTTP API layer for the storefront.
//!
//! Exposes the store API shipping method endpoint behind the sales channel
//! context middleware.

mod context;
mod criteria;
pub mod handlers;
mod routes;
mod types;
mod version;

pub use context::ContextResolver;
pub use routes::build_router;
