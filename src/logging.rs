//! Tracing setup for the store API.
//!
//! Production output is one JSON object per line so request logs from the
//! HTTP trace layer and the shipping route can be filtered by field
//! (`sales_channel_id`, `total`, ...).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "storefront_api=info,tower_http=info";

/// Install the global JSON subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Plain-text subscriber for tests; repeated calls are ignored.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("storefront_api=debug")
        .try_init();
}
