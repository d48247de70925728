//! HTTP request handlers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Extension, Json,
};

use crate::api::criteria::{build_criteria, parse_body};
use crate::api::types::*;
use crate::domain::{RequestParameters, SalesChannelContext};
use crate::error::StoreApiResult;
use crate::shipping::ONLY_AVAILABLE;
use crate::AppState;

/// List the shipping methods of the current sales channel.
///
/// GET /store-api/v{version}/shipping-method
#[utoipa::path(
    get,
    path = "/store-api/{version}/shipping-method",
    params(
        ("version" = String, Path, description = "API version, e.g. v3"),
        ShippingMethodQuery,
        ("sw-access-key" = String, Header, description = "Sales channel access key"),
        ("sw-context-token" = Option<String>, Header, description = "Context token")
    ),
    responses(
        (status = 200, description = "Shipping methods of the sales channel", body = ShippingMethodListResponse),
        (status = 400, description = "Invalid criteria"),
        (status = 401, description = "Missing or invalid access key"),
        (status = 404, description = "Unsupported API version")
    ),
    tag = "shipping-method"
)]
pub async fn list_shipping_methods(
    state: State<AppState>,
    query: Query<ShippingMethodQuery>,
    context: Extension<SalesChannelContext>,
) -> StoreApiResult<Json<ShippingMethodListResponse>> {
    load_shipping_methods(state, query, context, Bytes::new()).await
}

/// Search the shipping methods of the current sales channel with a criteria body.
///
/// POST /store-api/v{version}/shipping-method
#[utoipa::path(
    post,
    path = "/store-api/{version}/shipping-method",
    params(
        ("version" = String, Path, description = "API version, e.g. v3"),
        ShippingMethodQuery,
        ("sw-access-key" = String, Header, description = "Sales channel access key"),
        ("sw-context-token" = Option<String>, Header, description = "Context token")
    ),
    request_body = CriteriaRequest,
    responses(
        (status = 200, description = "Shipping methods of the sales channel", body = ShippingMethodListResponse),
        (status = 400, description = "Invalid criteria"),
        (status = 401, description = "Missing or invalid access key"),
        (status = 404, description = "Unsupported API version")
    ),
    tag = "shipping-method"
)]
pub async fn search_shipping_methods(
    state: State<AppState>,
    query: Query<ShippingMethodQuery>,
    context: Extension<SalesChannelContext>,
    body: Bytes,
) -> StoreApiResult<Json<ShippingMethodListResponse>> {
    load_shipping_methods(state, query, context, body).await
}

async fn load_shipping_methods(
    State(state): State<AppState>,
    Query(query): Query<ShippingMethodQuery>,
    Extension(context): Extension<SalesChannelContext>,
    body: Bytes,
) -> StoreApiResult<Json<ShippingMethodListResponse>> {
    let body = parse_body(&body)?;
    let mut criteria = build_criteria(&query, &body, state.store_api.max_limit)?;

    let flags = query
        .only_available
        .iter()
        .map(|value| (ONLY_AVAILABLE.to_string(), value.clone()))
        .collect();
    let params = RequestParameters::new(flags, body);

    tracing::info!(
        sales_channel_id = %context.sales_channel_id(),
        only_available = params.boolean(ONLY_AVAILABLE, false),
        "Loading shipping methods"
    );

    let response = state
        .shipping_method_route
        .load(&params, &context, &mut criteria)
        .await?;

    tracing::info!(
        sales_channel_id = %context.sales_channel_id(),
        total = response.result().total,
        returned = response.shipping_methods().len(),
        "Shipping methods loaded"
    );

    Ok(Json(response.into()))
}

/// Health check endpoint.
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_status = match sqlx::query("SELECT 1")
        .fetch_one(state.repository.pool())
        .await
    {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
