//! Store API routes of the shipping domain.

mod route;

pub use route::*;
