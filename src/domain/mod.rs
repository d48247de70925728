//! Domain types for the storefront API.
//!
//! This module contains the entities, the search criteria and the
//! request context value objects.

mod criteria;
mod request;
mod rule;
mod sales_channel;
mod search_result;
mod shipping_method;

pub use criteria::*;
pub use request::*;
pub use rule::*;
pub use sales_channel::*;
pub use search_result::*;
pub use shipping_method::*;
