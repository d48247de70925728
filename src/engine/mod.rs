//! Rule engine for the storefront API.
//!
//! Decides which business rules are valid for a sales channel context.

mod rule_matcher;

pub use rule_matcher::*;
