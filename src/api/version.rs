//! API version check for store API routes.
//!
//! Runs before the sales channel context is resolved, so requests for an
//! unsupported version never touch the database.

use axum::{
    body::Body,
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::StoreApiConfig;
use crate::error::{StoreApiError, StoreApiResult};

/// Parse a `v3` style path segment against the supported versions.
pub fn api_version(segment: &str, config: &StoreApiConfig) -> StoreApiResult<u32> {
    segment
        .strip_prefix('v')
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| config.supports_version(*v))
        .ok_or_else(|| StoreApiError::NotFound(format!("Unsupported API version: {}", segment)))
}

/// Reject requests whose `:version` segment is not supported.
pub async fn require_supported_version(
    State(config): State<StoreApiConfig>,
    Path(version): Path<String>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StoreApiError> {
    let version = api_version(&version, &config)?;
    tracing::debug!(version, "Store API version accepted");

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_parsing() {
        let config = StoreApiConfig::default();

        assert_eq!(api_version("v3", &config).unwrap(), 3);
        for segment in ["v99", "3", "vx", "v", ""] {
            assert!(
                matches!(api_version(segment, &config), Err(StoreApiError::NotFound(_))),
                "{:?} should be rejected",
                segment
            );
        }
    }
}
