//! Database models for the storefront API.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{AvailabilityRule, Media, Rule, SalesChannel, ShippingMethod};
use crate::error::{StoreApiError, StoreApiResult};

fn parse_uuid(value: &str) -> StoreApiResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| StoreApiError::Internal(e.to_string()))
}

fn parse_timestamp(value: &str) -> StoreApiResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| StoreApiError::Internal(e.to_string()))?
        .with_timezone(&Utc))
}

/// Database row for sales_channels table.
#[derive(Debug, Clone, FromRow)]
pub struct SalesChannelRow {
    pub id: String,
    pub name: String,
    #[allow(dead_code)]
    pub access_key_hash: String,
    pub currency_id: String,
    pub language_id: String,
    pub active: i32,
    pub created_at: String,
}

impl TryFrom<SalesChannelRow> for SalesChannel {
    type Error = StoreApiError;

    fn try_from(row: SalesChannelRow) -> Result<Self, Self::Error> {
        Ok(SalesChannel {
            id: parse_uuid(&row.id)?,
            name: row.name,
            currency_id: parse_uuid(&row.currency_id)?,
            language_id: parse_uuid(&row.language_id)?,
            active: row.active != 0,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

/// Database row for context_tokens table.
#[derive(Debug, Clone, FromRow)]
pub struct ContextTokenRow {
    pub token: String,
    pub sales_channel_id: String,
    pub customer_id: Option<String>,
    #[allow(dead_code)]
    pub updated_at: String,
}

/// Persisted state behind a context token.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextTokenRecord {
    pub token: String,
    pub sales_channel_id: Uuid,
    pub customer_id: Option<Uuid>,
}

impl TryFrom<ContextTokenRow> for ContextTokenRecord {
    type Error = StoreApiError;

    fn try_from(row: ContextTokenRow) -> Result<Self, Self::Error> {
        Ok(ContextTokenRecord {
            token: row.token,
            sales_channel_id: parse_uuid(&row.sales_channel_id)?,
            customer_id: row.customer_id.as_deref().map(parse_uuid).transpose()?,
        })
    }
}

/// Database row for rules table.
#[derive(Debug, Clone, FromRow)]
pub struct RuleRow {
    pub id: String,
    pub name: String,
    pub priority: i64,
    pub conditions: String,
    pub created_at: String,
}

impl TryFrom<RuleRow> for Rule {
    type Error = StoreApiError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        Ok(Rule {
            id: parse_uuid(&row.id)?,
            name: row.name,
            priority: row.priority,
            conditions: serde_json::from_str(&row.conditions)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<RuleRow> for AvailabilityRule {
    type Error = StoreApiError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        Ok(AvailabilityRule {
            id: parse_uuid(&row.id)?,
            name: row.name,
            priority: row.priority,
        })
    }
}

/// Database row for media table.
#[derive(Debug, Clone, FromRow)]
pub struct MediaRow {
    pub id: String,
    pub url: String,
    pub alt: Option<String>,
    pub mime_type: String,
    pub file_name: String,
}

impl TryFrom<MediaRow> for Media {
    type Error = StoreApiError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        Ok(Media {
            id: parse_uuid(&row.id)?,
            url: row.url,
            alt: row.alt,
            mime_type: row.mime_type,
            file_name: row.file_name,
        })
    }
}

/// Database row for shipping_methods table.
#[derive(Debug, Clone, FromRow)]
pub struct ShippingMethodRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: i32,
    pub position: i64,
    pub media_id: Option<String>,
    pub availability_rule_id: Option<String>,
    pub created_at: String,
}

impl TryFrom<ShippingMethodRow> for ShippingMethod {
    type Error = StoreApiError;

    fn try_from(row: ShippingMethodRow) -> Result<Self, Self::Error> {
        Ok(ShippingMethod {
            id: parse_uuid(&row.id)?,
            name: row.name,
            description: row.description,
            active: row.active != 0,
            position: row.position,
            media_id: row.media_id.as_deref().map(parse_uuid).transpose()?,
            availability_rule_id: row
                .availability_rule_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?,
            media: None,
            availability_rule: None,
            created_at: parse_timestamp(&row.created_at)?,
            api_alias: "shipping_method".to_string(),
        })
    }
}
