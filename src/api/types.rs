//! API request and response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{Aggregation, Filter, ShippingMethod, Sorting};
use crate::shipping::ShippingMethodRouteResponse;

// ==================== Shipping Methods ====================

/// Query parameters accepted by the shipping method endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShippingMethodQuery {
    /// Page size.
    pub limit: Option<String>,
    /// 1-based page number.
    pub page: Option<String>,
    /// Comma separated shipping method ids.
    pub ids: Option<String>,
    /// Only return methods whose availability rule is active (`1`, `true`, `on`, `yes`).
    pub only_available: Option<String>,
}

/// Criteria body accepted by `POST` requests.
///
/// The body may also carry `onlyAvailable`; it is read from the raw body so
/// the permissive flag parsing applies.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaRequest {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    #[serde(default)]
    pub ids: Vec<Uuid>,
    #[serde(default)]
    pub filter: Vec<Filter>,
    #[serde(default)]
    pub sort: Vec<Sorting>,
    /// Association names mapped to (ignored) nested criteria.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub associations: BTreeMap<String, Value>,
    #[serde(default)]
    pub aggregations: Vec<Aggregation>,
}

/// Shipping method list response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodListResponse {
    /// Number of matching methods, before `onlyAvailable` narrowing.
    pub total: u64,
    #[schema(value_type = Object)]
    pub aggregations: Map<String, Value>,
    pub page: u32,
    pub limit: Option<u32>,
    pub elements: Vec<ShippingMethod>,
    pub api_alias: String,
}

impl From<ShippingMethodRouteResponse> for ShippingMethodListResponse {
    fn from(response: ShippingMethodRouteResponse) -> Self {
        let result = response.into_result();
        Self {
            total: result.total,
            aggregations: result.aggregations,
            page: result.page,
            limit: result.limit,
            elements: result.entities.into_inner(),
            api_alias: "shipping_method_route_response".to_string(),
        }
    }
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
    /// Timestamp.
    pub timestamp: String,
}
