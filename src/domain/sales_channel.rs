//! Sales channel and the per-request context derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A storefront instance with its own access key, currency and language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesChannel {
    pub id: Uuid,
    pub name: String,
    pub currency_id: Uuid,
    pub language_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl SalesChannel {
    /// Create a new active sales channel with fresh currency and language ids.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            currency_id: Uuid::new_v4(),
            language_id: Uuid::new_v4(),
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// Everything a store API request knows about who it serves.
///
/// Built once per request by the context middleware; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesChannelContext {
    pub token: String,
    pub sales_channel: SalesChannel,
    pub currency_id: Uuid,
    pub language_id: Uuid,
    pub customer_id: Option<Uuid>,
    /// Ids of the rules that are valid for this context, highest priority first.
    pub rule_ids: Vec<Uuid>,
}

impl SalesChannelContext {
    /// Context using the sales channel defaults and a fresh token.
    pub fn new(sales_channel: SalesChannel, rule_ids: Vec<Uuid>) -> Self {
        Self {
            token: Uuid::new_v4().simple().to_string(),
            currency_id: sales_channel.currency_id,
            language_id: sales_channel.language_id,
            sales_channel,
            customer_id: None,
            rule_ids,
        }
    }

    pub fn sales_channel_id(&self) -> Uuid {
        self.sales_channel.id
    }

    pub fn is_customer_logged_in(&self) -> bool {
        self.customer_id.is_some()
    }
}
