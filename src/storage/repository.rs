//! Repository layer for database operations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Map;
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::domain::{
    AggregationKind, AvailabilityRule, EntitySearchResult, Media, Rule, SalesChannel,
    SalesChannelContext, SearchCriteria, ShippingMethod, ShippingMethodCollection,
};
use crate::error::StoreApiResult;
use crate::storage::models::{
    ContextTokenRecord, ContextTokenRow, MediaRow, RuleRow, SalesChannelRow, ShippingMethodRow,
};
use crate::storage::query;

/// Search access to shipping methods, scoped to a sales channel.
#[async_trait]
pub trait ShippingMethodRepository: Send + Sync {
    /// Run the criteria against the shipping methods of the context's sales channel.
    async fn search(
        &self,
        criteria: &SearchCriteria,
        context: &SalesChannelContext,
    ) -> StoreApiResult<EntitySearchResult<ShippingMethodCollection>>;
}

/// Repository for all storefront database operations.
#[derive(Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StoreRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hash an access key for storage/comparison.
    pub fn hash_access_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> StoreApiResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sales_channels (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                access_key_hash TEXT NOT NULL UNIQUE,
                currency_id TEXT NOT NULL,
                language_id TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sales_channels_access_key ON sales_channels(access_key_hash);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS context_tokens (
                token TEXT PRIMARY KEY,
                sales_channel_id TEXT NOT NULL,
                customer_id TEXT,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (sales_channel_id) REFERENCES sales_channels(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rules (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                conditions TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS media (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                alt TEXT,
                mime_type TEXT NOT NULL,
                file_name TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS shipping_methods (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                active INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL DEFAULT 1,
                media_id TEXT,
                availability_rule_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (media_id) REFERENCES media(id) ON DELETE SET NULL,
                FOREIGN KEY (availability_rule_id) REFERENCES rules(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_shipping_methods_active ON shipping_methods(active);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sales_channel_shipping_methods (
                sales_channel_id TEXT NOT NULL,
                shipping_method_id TEXT NOT NULL,
                PRIMARY KEY (sales_channel_id, shipping_method_id),
                FOREIGN KEY (sales_channel_id) REFERENCES sales_channels(id) ON DELETE CASCADE,
                FOREIGN KEY (shipping_method_id) REFERENCES shipping_methods(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ==================== Sales Channels ====================

    /// Create a sales channel reachable with the given access key.
    pub async fn create_sales_channel(
        &self,
        sales_channel: &SalesChannel,
        access_key: &str,
    ) -> StoreApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales_channels (id, name, access_key_hash, currency_id, language_id, active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sales_channel.id.to_string())
        .bind(&sales_channel.name)
        .bind(Self::hash_access_key(access_key))
        .bind(sales_channel.currency_id.to_string())
        .bind(sales_channel.language_id.to_string())
        .bind(if sales_channel.active { 1 } else { 0 })
        .bind(sales_channel.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find the sales channel owning an access key.
    pub async fn find_sales_channel_by_access_key(
        &self,
        access_key: &str,
    ) -> StoreApiResult<Option<SalesChannel>> {
        let row: Option<SalesChannelRow> =
            sqlx::query_as("SELECT * FROM sales_channels WHERE access_key_hash = ?")
                .bind(Self::hash_access_key(access_key))
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    // ==================== Context Tokens ====================

    /// Persist the state behind a context token.
    ///
    /// A token never changes its sales channel: saving a token owned by
    /// another channel writes nothing and returns `false`.
    pub async fn save_context_token(
        &self,
        token: &str,
        sales_channel_id: Uuid,
        customer_id: Option<Uuid>,
    ) -> StoreApiResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO context_tokens (token, sales_channel_id, customer_id, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(token) DO UPDATE SET
                customer_id = excluded.customer_id,
                updated_at = excluded.updated_at
            WHERE context_tokens.sales_channel_id = excluded.sales_channel_id
            "#,
        )
        .bind(token)
        .bind(sales_channel_id.to_string())
        .bind(customer_id.map(|id| id.to_string()))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Load a context token regardless of the sales channel owning it.
    pub async fn find_context_token(
        &self,
        token: &str,
    ) -> StoreApiResult<Option<ContextTokenRecord>> {
        let row: Option<ContextTokenRow> =
            sqlx::query_as("SELECT * FROM context_tokens WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Mark a token as used now.
    pub async fn touch_context_token(&self, token: &str) -> StoreApiResult<()> {
        sqlx::query("UPDATE context_tokens SET updated_at = ? WHERE token = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete tokens not used since `before`. Returns the number removed.
    pub async fn purge_context_tokens(&self, before: DateTime<Utc>) -> StoreApiResult<u64> {
        let result = sqlx::query("DELETE FROM context_tokens WHERE updated_at < ?")
            .bind(before.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ==================== Rules ====================

    /// Create a rule.
    pub async fn create_rule(&self, rule: &Rule) -> StoreApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rules (id, name, priority, conditions, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(rule.id.to_string())
        .bind(&rule.name)
        .bind(rule.priority)
        .bind(serde_json::to_string(&rule.conditions)?)
        .bind(rule.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all rules, highest priority first.
    pub async fn list_rules(&self) -> StoreApiResult<Vec<Rule>> {
        let rows: Vec<RuleRow> =
            sqlx::query_as("SELECT * FROM rules ORDER BY priority DESC, name ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    // ==================== Media ====================

    /// Create a media entry.
    pub async fn create_media(&self, media: &Media) -> StoreApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO media (id, url, alt, mime_type, file_name)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(media.id.to_string())
        .bind(&media.url)
        .bind(&media.alt)
        .bind(&media.mime_type)
        .bind(&media.file_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ==================== Shipping Methods ====================

    /// Create a shipping method. Associations on the struct are ignored; only ids are stored.
    pub async fn create_shipping_method(&self, method: &ShippingMethod) -> StoreApiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shipping_methods (id, name, description, active, position, media_id, availability_rule_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(method.id.to_string())
        .bind(&method.name)
        .bind(&method.description)
        .bind(if method.active { 1 } else { 0 })
        .bind(method.position)
        .bind(method.media_id.map(|id| id.to_string()))
        .bind(method.availability_rule_id.map(|id| id.to_string()))
        .bind(method.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Make a shipping method visible in a sales channel.
    pub async fn assign_shipping_method(
        &self,
        sales_channel_id: Uuid,
        shipping_method_id: Uuid,
    ) -> StoreApiResult<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO sales_channel_shipping_methods (sales_channel_id, shipping_method_id)
            VALUES (?, ?)
            "#,
        )
        .bind(sales_channel_id.to_string())
        .bind(shipping_method_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_media(&self, ids: &[Uuid]) -> StoreApiResult<HashMap<Uuid, Media>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM media WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        qb.push(")");

        let rows: Vec<MediaRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| Media::try_from(row).map(|media| (media.id, media)))
            .collect()
    }

    async fn load_availability_rules(
        &self,
        ids: &[Uuid],
    ) -> StoreApiResult<HashMap<Uuid, AvailabilityRule>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM rules WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        qb.push(")");

        let rows: Vec<RuleRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| AvailabilityRule::try_from(row).map(|rule| (rule.id, rule)))
            .collect()
    }

    /// Attach the requested associations to the loaded methods.
    async fn load_associations(
        &self,
        criteria: &SearchCriteria,
        methods: &mut ShippingMethodCollection,
    ) -> StoreApiResult<()> {
        if methods.is_empty() {
            return Ok(());
        }

        if criteria.has_association("media") {
            let ids: Vec<Uuid> = methods.iter().filter_map(|m| m.media_id).collect();
            let media = self.load_media(&ids).await?;
            for method in methods.iter_mut() {
                method.media = method.media_id.and_then(|id| media.get(&id).cloned());
            }
        }

        if criteria.has_association("availabilityRule") {
            let ids: Vec<Uuid> = methods
                .iter()
                .filter_map(|m| m.availability_rule_id)
                .collect();
            let rules = self.load_availability_rules(&ids).await?;
            for method in methods.iter_mut() {
                method.availability_rule = method
                    .availability_rule_id
                    .and_then(|id| rules.get(&id).cloned());
            }
        }

        Ok(())
    }

    async fn count_total(
        &self,
        criteria: &SearchCriteria,
        context: &SalesChannelContext,
    ) -> StoreApiResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        query::push_from_where(&mut qb, criteria, context)?;

        let (total,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn run_aggregations(
        &self,
        criteria: &SearchCriteria,
        context: &SalesChannelContext,
    ) -> StoreApiResult<Map<String, serde_json::Value>> {
        let mut results = Map::new();

        for aggregation in criteria.aggregations() {
            let mut qb = QueryBuilder::<Sqlite>::new(query::aggregation_select(aggregation)?);
            query::push_from_where(&mut qb, criteria, context)?;

            let value = match aggregation.kind {
                AggregationKind::Count => {
                    let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
                    serde_json::json!({ "count": count })
                }
                AggregationKind::Terms => {
                    let column = query::field(&aggregation.field)?.column;
                    qb.push(format!(" GROUP BY {} ORDER BY COUNT(*) DESC, {} ASC", column, column));
                    let rows: Vec<(Option<String>, i64)> =
                        qb.build_query_as().fetch_all(&self.pool).await?;
                    let buckets = rows
                        .into_iter()
                        .map(|(key, count)| Ok((query::bucket_key(aggregation, key)?, count)))
                        .collect::<StoreApiResult<Vec<_>>>()?;
                    query::terms_result(buckets)
                }
                kind => {
                    let (value,): (Option<f64>,) =
                        qb.build_query_as().fetch_one(&self.pool).await?;
                    query::metric_result(kind, value)
                }
            };

            results.insert(aggregation.name.clone(), value);
        }

        Ok(results)
    }
}

#[async_trait]
impl ShippingMethodRepository for StoreRepository {
    async fn search(
        &self,
        criteria: &SearchCriteria,
        context: &SalesChannelContext,
    ) -> StoreApiResult<EntitySearchResult<ShippingMethodCollection>> {
        query::validate_associations(criteria)?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT sm.*");
        query::push_from_where(&mut qb, criteria, context)?;
        query::push_order_by(&mut qb, criteria)?;
        query::push_pagination(&mut qb, criteria);

        let rows: Vec<ShippingMethodRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut methods = rows
            .into_iter()
            .map(ShippingMethod::try_from)
            .collect::<StoreApiResult<ShippingMethodCollection>>()?;

        self.load_associations(criteria, &mut methods).await?;
        let total = self.count_total(criteria, context).await?;
        let aggregations = self.run_aggregations(criteria, context).await?;

        tracing::debug!(
            sales_channel_id = %context.sales_channel_id(),
            total,
            returned = methods.len(),
            "Shipping method search complete"
        );

        Ok(EntitySearchResult::new(
            total,
            aggregations,
            criteria.page(),
            criteria.limit(),
            methods,
        ))
    }
}
