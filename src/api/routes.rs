//! Route definitions for the API.

use axum::{http::HeaderName, middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::context::{
    require_sales_channel_context, ContextResolver, ACCESS_KEY_HEADER, CONTEXT_TOKEN_HEADER,
};
use crate::api::handlers;
use crate::api::version::require_supported_version;
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "access_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(ACCESS_KEY_HEADER))),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_shipping_methods,
        handlers::search_shipping_methods,
        handlers::health_check,
    ),
    components(schemas(
        crate::api::types::CriteriaRequest,
        crate::api::types::ShippingMethodListResponse,
        crate::api::types::HealthResponse,
        crate::domain::ShippingMethod,
        crate::domain::Media,
        crate::domain::AvailabilityRule,
        crate::domain::Filter,
        crate::domain::Sorting,
        crate::domain::SortOrder,
        crate::domain::Aggregation,
        crate::domain::AggregationKind,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "shipping-method", description = "Shipping methods of a sales channel"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Storefront Store API",
        version = "0.1.0",
        description = "Store API listing the shipping methods of a sales channel",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Build the API router.
///
/// Store API routes check the API version, then require a sales channel
/// context; `/health` and the OpenAPI docs are public.
pub fn build_router(state: AppState, resolver: ContextResolver) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(CONTEXT_TOKEN_HEADER)]);

    let store_api_routes = Router::new()
        .route(
            "/store-api/:version/shipping-method",
            get(handlers::list_shipping_methods).post(handlers::search_shipping_methods),
        )
        .layer(middleware::from_fn_with_state(
            resolver,
            require_sales_channel_context,
        ))
        .layer(middleware::from_fn_with_state(
            state.store_api.clone(),
            require_supported_version,
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state);

    Router::new()
        .merge(store_api_routes)
        .merge(public_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePool;
    use tower::ServiceExt;

    use crate::config::StoreApiConfig;
    use crate::engine::ConditionRuleMatcher;
    use crate::shipping::BaseShippingMethodRoute;
    use crate::storage::{seed_demo_data, StoreRepository};

    const KEY: &str = "SWSC-TEST";
    const DEMO_CUSTOMER_TOKEN: &str = "demo-customer-token";

    async fn app() -> Router {
        crate::logging::init_test();

        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let repository = StoreRepository::new(pool);
        repository.init_schema().await.unwrap();
        seed_demo_data(&repository, KEY).await.unwrap();

        let state = AppState {
            shipping_method_route: Arc::new(BaseShippingMethodRoute::new(Arc::new(
                repository.clone(),
            ))),
            repository: repository.clone(),
            store_api: StoreApiConfig::default(),
        };
        let resolver = ContextResolver::new(repository, Arc::new(ConditionRuleMatcher::new()));

        build_router(state, resolver)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(ACCESS_KEY_HEADER, KEY)
            .body(Body::empty())
            .unwrap()
    }

    fn post_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(ACCESS_KEY_HEADER, KEY)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn names(body: &Value) -> Vec<String> {
        body["elements"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_missing_access_key() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/store-api/v3/shipping-method")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "MISSING_ACCESS_KEY");
    }

    #[tokio::test]
    async fn test_invalid_access_key() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/store-api/v3/shipping-method")
                    .header(ACCESS_KEY_HEADER, "SWSC-WRONG")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "INVALID_ACCESS_KEY");
    }

    #[tokio::test]
    async fn test_lists_active_methods_with_media() {
        let response = app()
            .await
            .oneshot(get_request("/store-api/v3/shipping-method"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(CONTEXT_TOKEN_HEADER));

        let body = json_body(response).await;
        assert_eq!(body["apiAlias"], "shipping_method_route_response");
        assert_eq!(body["total"], 4);
        assert_eq!(names(&body), vec!["Standard", "Express", "Pickup", "Freight"]);
        assert_eq!(body["elements"][1]["media"]["fileName"], "express.png");
        assert_eq!(body["elements"][0]["media"], Value::Null);
    }

    #[tokio::test]
    async fn test_only_available_keeps_total() {
        let response = app()
            .await
            .oneshot(get_request("/store-api/v3/shipping-method?onlyAvailable=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total"], 4);
        assert_eq!(names(&body), vec!["Standard", "Pickup"]);
    }

    #[tokio::test]
    async fn test_logged_in_customer_sees_customer_methods() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/store-api/v3/shipping-method?onlyAvailable=1")
                    .header(ACCESS_KEY_HEADER, KEY)
                    .header(CONTEXT_TOKEN_HEADER, DEMO_CUSTOMER_TOKEN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[CONTEXT_TOKEN_HEADER], DEMO_CUSTOMER_TOKEN);
        let body = json_body(response).await;
        assert_eq!(names(&body), vec!["Standard", "Express", "Pickup"]);
    }

    #[tokio::test]
    async fn test_post_criteria() {
        let response = app()
            .await
            .oneshot(post_request(
                "/store-api/v3/shipping-method",
                json!({
                    "limit": 2,
                    "sort": [{"field": "name", "order": "DESC"}],
                    "aggregations": [{"name": "positions", "type": "max", "field": "position"}],
                    "onlyAvailable": "true"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total"], 4);
        assert_eq!(body["limit"], 2);
        // page one sorted by name desc is Standard, Pickup; both available
        assert_eq!(names(&body), vec!["Standard", "Pickup"]);
        assert_eq!(body["aggregations"]["positions"]["max"], json!(4.0));
    }

    #[tokio::test]
    async fn test_unknown_association_is_bad_request() {
        let response = app()
            .await
            .oneshot(post_request(
                "/store-api/v3/shipping-method",
                json!({"associations": {"prices": {}}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/store-api/v3/shipping-method")
                    .header(ACCESS_KEY_HEADER, KEY)
                    .body(Body::from("{\"limit\":"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_version() {
        let response = app()
            .await
            .oneshot(get_request("/store-api/v99/shipping-method"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsupported_version_checked_before_access_key() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/store-api/v99/shipping-method")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key(CONTEXT_TOKEN_HEADER));
    }

    #[tokio::test]
    async fn test_context_token_is_echoed() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/store-api/v3/shipping-method")
                    .header(ACCESS_KEY_HEADER, KEY)
                    .header(CONTEXT_TOKEN_HEADER, "my-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[CONTEXT_TOKEN_HEADER], "my-token");
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = app()
            .await
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["database"], "connected");
    }
}
