//! Sales channel context resolution middleware for axum.
//!
//! Every store API request names its sales channel with the `sw-access-key`
//! header. The middleware turns that (plus the optional token, currency and
//! language headers) into a [`SalesChannelContext`] stored in the request
//! extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::SalesChannelContext;
use crate::engine::RuleMatcher;
use crate::error::{StoreApiError, StoreApiResult};
use crate::storage::StoreRepository;

pub const ACCESS_KEY_HEADER: &str = "sw-access-key";
pub const CONTEXT_TOKEN_HEADER: &str = "sw-context-token";
pub const CURRENCY_ID_HEADER: &str = "sw-currency-id";
pub const LANGUAGE_ID_HEADER: &str = "sw-language-id";

/// Error response for access key failures.
#[derive(Debug, Serialize)]
pub struct AccessKeyError {
    pub error: String,
    pub code: String,
}

impl AccessKeyError {
    fn missing() -> Self {
        Self {
            error: "Missing sales channel access key".to_string(),
            code: "MISSING_ACCESS_KEY".to_string(),
        }
    }

    fn invalid() -> Self {
        Self {
            error: "Invalid sales channel access key".to_string(),
            code: "INVALID_ACCESS_KEY".to_string(),
        }
    }
}

impl IntoResponse for AccessKeyError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Context-relevant request headers.
#[derive(Debug, Clone, Default)]
pub struct ContextHeaders {
    pub access_key: String,
    pub token: Option<String>,
    pub currency_id: Option<Uuid>,
    pub language_id: Option<Uuid>,
}

impl ContextHeaders {
    /// Read the headers; `None` if the access key is missing.
    pub fn from_headers(headers: &HeaderMap) -> StoreApiResult<Option<Self>> {
        let Some(access_key) = header_str(headers, ACCESS_KEY_HEADER) else {
            return Ok(None);
        };

        Ok(Some(Self {
            access_key: access_key.to_string(),
            token: header_str(headers, CONTEXT_TOKEN_HEADER).map(String::from),
            currency_id: header_uuid(headers, CURRENCY_ID_HEADER)?,
            language_id: header_uuid(headers, LANGUAGE_ID_HEADER)?,
        }))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn header_uuid(headers: &HeaderMap, name: &str) -> StoreApiResult<Option<Uuid>> {
    header_str(headers, name)
        .map(|v| {
            Uuid::parse_str(v)
                .map_err(|_| StoreApiError::BadRequest(format!("Header {} is not a valid id", name)))
        })
        .transpose()
}

/// Builds sales channel contexts from request headers.
#[derive(Clone)]
pub struct ContextResolver {
    repository: StoreRepository,
    rule_matcher: Arc<dyn RuleMatcher>,
}

impl ContextResolver {
    pub fn new(repository: StoreRepository, rule_matcher: Arc<dyn RuleMatcher>) -> Self {
        Self {
            repository,
            rule_matcher,
        }
    }

    /// Resolve the context, or `None` when the access key is unknown or inactive.
    pub async fn resolve(
        &self,
        headers: &ContextHeaders,
    ) -> StoreApiResult<Option<SalesChannelContext>> {
        let Some(sales_channel) = self
            .repository
            .find_sales_channel_by_access_key(&headers.access_key)
            .await?
        else {
            return Ok(None);
        };

        if !sales_channel.active {
            tracing::warn!(sales_channel_id = %sales_channel.id, "Access key of inactive sales channel used");
            return Ok(None);
        }

        let mut context = SalesChannelContext::new(sales_channel, Vec::new());

        // Anonymous tokens carry no state and are not persisted.
        if let Some(token) = &headers.token {
            match self.repository.find_context_token(token).await? {
                Some(record) if record.sales_channel_id == context.sales_channel_id() => {
                    tracing::debug!(
                        sales_channel_id = %record.sales_channel_id,
                        logged_in = record.customer_id.is_some(),
                        "Context token restored"
                    );
                    context.token = record.token;
                    context.customer_id = record.customer_id;
                    self.repository.touch_context_token(&context.token).await?;
                }
                Some(record) => {
                    tracing::warn!(
                        sales_channel_id = %context.sales_channel_id(),
                        owner_sales_channel_id = %record.sales_channel_id,
                        "Context token of another sales channel used, issuing a new one"
                    );
                }
                None => context.token = token.clone(),
            }
        }

        if let Some(currency_id) = headers.currency_id {
            context.currency_id = currency_id;
        }
        if let Some(language_id) = headers.language_id {
            context.language_id = language_id;
        }

        let rules = self.repository.list_rules().await?;
        context.rule_ids = self.rule_matcher.match_rules(&rules, &context);

        Ok(Some(context))
    }
}

/// Require a valid `sw-access-key` and attach the resolved context.
///
/// The context token is echoed back in the `sw-context-token` response header.
pub async fn require_sales_channel_context(
    State(resolver): State<ContextResolver>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let headers = ContextHeaders::from_headers(request.headers())
        .map_err(IntoResponse::into_response)?
        .ok_or_else(|| AccessKeyError::missing().into_response())?;

    let context = resolver
        .resolve(&headers)
        .await
        .map_err(IntoResponse::into_response)?
        .ok_or_else(|| {
            let prefix: String = headers.access_key.chars().take(8).collect();
            tracing::warn!(key_prefix = %prefix, "Invalid access key attempted");
            AccessKeyError::invalid().into_response()
        })?;

    let token = context.token.clone();
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(CONTEXT_TOKEN_HEADER, value);
    }

    Ok(response)
}
