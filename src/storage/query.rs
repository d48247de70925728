//! Translation of [`SearchCriteria`] into SQLite queries.
//!
//! Only whitelisted fields reach the SQL text; every value is bound.

use serde_json::{json, Map, Number, Value};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::domain::{Aggregation, AggregationKind, Filter, SalesChannelContext, SearchCriteria};
use crate::error::{StoreApiError, StoreApiResult};

/// Storage type of a searchable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Uuid,
    Text,
    Bool,
    Int,
    Timestamp,
}

/// A field of the shipping_method entity that criteria may reference.
#[derive(Debug, Clone, Copy)]
pub struct FieldDefinition {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

const SHIPPING_METHOD_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        name: "id",
        column: "sm.id",
        kind: FieldKind::Uuid,
    },
    FieldDefinition {
        name: "name",
        column: "sm.name",
        kind: FieldKind::Text,
    },
    FieldDefinition {
        name: "description",
        column: "sm.description",
        kind: FieldKind::Text,
    },
    FieldDefinition {
        name: "active",
        column: "sm.active",
        kind: FieldKind::Bool,
    },
    FieldDefinition {
        name: "position",
        column: "sm.position",
        kind: FieldKind::Int,
    },
    FieldDefinition {
        name: "mediaId",
        column: "sm.media_id",
        kind: FieldKind::Uuid,
    },
    FieldDefinition {
        name: "availabilityRuleId",
        column: "sm.availability_rule_id",
        kind: FieldKind::Uuid,
    },
    FieldDefinition {
        name: "createdAt",
        column: "sm.created_at",
        kind: FieldKind::Timestamp,
    },
];

/// Associations that can be eager loaded on shipping methods.
pub const SHIPPING_METHOD_ASSOCIATIONS: &[&str] = &["media", "availabilityRule"];

/// Look up a field by its API name.
pub fn field(name: &str) -> StoreApiResult<&'static FieldDefinition> {
    SHIPPING_METHOD_FIELDS
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| {
            StoreApiError::BadRequest(format!("Field \"{}\" not found on shipping_method", name))
        })
}

/// Reject association names the repository cannot load.
pub fn validate_associations(criteria: &SearchCriteria) -> StoreApiResult<()> {
    for name in criteria.associations() {
        if !SHIPPING_METHOD_ASSOCIATIONS.contains(&name) {
            return Err(StoreApiError::BadRequest(format!(
                "Association \"{}\" not found on shipping_method",
                name
            )));
        }
    }
    Ok(())
}

/// A value ready to be bound into a query.
#[derive(Debug, Clone, PartialEq)]
enum SqlValue {
    Text(String),
    Int(i64),
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: SqlValue) {
    match value {
        SqlValue::Text(text) => qb.push_bind(text),
        SqlValue::Int(int) => qb.push_bind(int),
    };
}

fn invalid_value(field: &FieldDefinition, value: &Value) -> StoreApiError {
    StoreApiError::BadRequest(format!(
        "Invalid value {} for field \"{}\"",
        value, field.name
    ))
}

/// Convert a JSON value to the storage representation of the field.
fn to_sql_value(field: &FieldDefinition, value: &Value) -> StoreApiResult<SqlValue> {
    match field.kind {
        FieldKind::Uuid => value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(|id| SqlValue::Text(id.to_string()))
            .ok_or_else(|| invalid_value(field, value)),
        FieldKind::Text => value
            .as_str()
            .map(|s| SqlValue::Text(s.to_string()))
            .ok_or_else(|| invalid_value(field, value)),
        FieldKind::Bool => match value {
            Value::Bool(b) => Ok(SqlValue::Int(i64::from(*b))),
            Value::Number(n) if n.as_i64() == Some(0) || n.as_i64() == Some(1) => {
                Ok(SqlValue::Int(n.as_i64().unwrap_or_default()))
            }
            _ => Err(invalid_value(field, value)),
        },
        FieldKind::Int => match value {
            Value::Number(n) => n.as_i64().map(SqlValue::Int),
            Value::String(s) => s.trim().parse().ok().map(SqlValue::Int),
            _ => None,
        }
        .ok_or_else(|| invalid_value(field, value)),
        FieldKind::Timestamp => value
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| SqlValue::Text(ts.with_timezone(&chrono::Utc).to_rfc3339()))
            .ok_or_else(|| invalid_value(field, value)),
    }
}

/// Escape LIKE wildcards so `Contains` matches literally.
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) -> StoreApiResult<()> {
    let def = field(filter.field())?;

    match filter {
        Filter::Equals { value, .. } => {
            if value.is_null() {
                qb.push(format!(" AND {} IS NULL", def.column));
            } else {
                let value = to_sql_value(def, value)?;
                qb.push(format!(" AND {} = ", def.column));
                push_value(qb, value);
            }
        }
        Filter::EqualsAny { values, .. } => {
            if values.is_empty() {
                qb.push(" AND 0 = 1");
                return Ok(());
            }
            let values = values
                .iter()
                .map(|v| to_sql_value(def, v))
                .collect::<StoreApiResult<Vec<_>>>()?;
            qb.push(format!(" AND {} IN (", def.column));
            let mut separated = qb.separated(", ");
            for value in values {
                match value {
                    SqlValue::Text(text) => separated.push_bind(text),
                    SqlValue::Int(int) => separated.push_bind(int),
                };
            }
            qb.push(")");
        }
        Filter::Contains { value, .. } => {
            if def.kind != FieldKind::Text {
                return Err(StoreApiError::BadRequest(format!(
                    "Contains filter is not supported on field \"{}\"",
                    def.name
                )));
            }
            qb.push(format!(" AND {} LIKE ", def.column));
            qb.push_bind(like_pattern(value));
            qb.push(" ESCAPE '\\'");
        }
        Filter::Range {
            gte, gt, lte, lt, ..
        } => {
            if matches!(def.kind, FieldKind::Bool | FieldKind::Uuid) {
                return Err(StoreApiError::BadRequest(format!(
                    "Range filter is not supported on field \"{}\"",
                    def.name
                )));
            }
            let bounds = [(">=", gte), (">", gt), ("<=", lte), ("<", lt)];
            for (operator, bound) in bounds {
                if let Some(bound) = bound {
                    let value = to_sql_value(def, bound)?;
                    qb.push(format!(" AND {} {} ", def.column, operator));
                    push_value(qb, value);
                }
            }
        }
    }

    Ok(())
}

/// Append the FROM/WHERE part shared by every query of one search.
///
/// Scopes to the sales channel of the context, then applies ids and filters.
pub fn push_from_where(
    qb: &mut QueryBuilder<'_, Sqlite>,
    criteria: &SearchCriteria,
    context: &SalesChannelContext,
) -> StoreApiResult<()> {
    qb.push(
        " FROM shipping_methods sm \
         INNER JOIN sales_channel_shipping_methods scsm \
         ON scsm.shipping_method_id = sm.id AND scsm.sales_channel_id = ",
    );
    qb.push_bind(context.sales_channel_id().to_string());
    qb.push(" WHERE 1 = 1");

    if !criteria.ids().is_empty() {
        qb.push(" AND sm.id IN (");
        let mut separated = qb.separated(", ");
        for id in criteria.ids() {
            separated.push_bind(id.to_string());
        }
        qb.push(")");
    }

    for filter in criteria.filters() {
        push_filter(qb, filter)?;
    }

    Ok(())
}

/// Append ORDER BY with the default `position, name, id` tie-break.
pub fn push_order_by(
    qb: &mut QueryBuilder<'_, Sqlite>,
    criteria: &SearchCriteria,
) -> StoreApiResult<()> {
    let mut clauses = Vec::with_capacity(criteria.sorting().len() + 3);
    for sorting in criteria.sorting() {
        let def = field(&sorting.field)?;
        clauses.push(format!("{} {}", def.column, sorting.order));
    }
    clauses.extend(
        ["sm.position ASC", "sm.name ASC", "sm.id ASC"]
            .iter()
            .map(|c| c.to_string()),
    );

    qb.push(" ORDER BY ");
    qb.push(clauses.join(", "));
    Ok(())
}

/// Append LIMIT/OFFSET when the criteria is paginated.
pub fn push_pagination(qb: &mut QueryBuilder<'_, Sqlite>, criteria: &SearchCriteria) {
    if let Some(limit) = criteria.limit() {
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::from(criteria.offset()));
    }
}

/// Build the SELECT expression of an aggregation.
pub fn aggregation_select(aggregation: &Aggregation) -> StoreApiResult<String> {
    let def = field(&aggregation.field)?;

    if aggregation.kind.is_numeric() && def.kind != FieldKind::Int {
        return Err(StoreApiError::BadRequest(format!(
            "Aggregation \"{}\" requires a numeric field, \"{}\" is not",
            aggregation.name, def.name
        )));
    }

    Ok(match aggregation.kind {
        AggregationKind::Count => format!("SELECT COUNT({})", def.column),
        AggregationKind::Terms => format!("SELECT CAST({} AS TEXT), COUNT(*)", def.column),
        AggregationKind::Min => format!("SELECT CAST(MIN({}) AS REAL)", def.column),
        AggregationKind::Max => format!("SELECT CAST(MAX({}) AS REAL)", def.column),
        AggregationKind::Avg => format!("SELECT CAST(AVG({}) AS REAL)", def.column),
        AggregationKind::Sum => format!("SELECT CAST(SUM({}) AS REAL)", def.column),
    })
}

/// Convert a terms bucket key back into its JSON representation.
pub fn bucket_key(aggregation: &Aggregation, key: Option<String>) -> StoreApiResult<Value> {
    let def = field(&aggregation.field)?;
    Ok(match (def.kind, key) {
        (_, None) => Value::Null,
        (FieldKind::Bool, Some(key)) => Value::Bool(key != "0"),
        (FieldKind::Int, Some(key)) => key
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::String(key)),
        (_, Some(key)) => Value::String(key),
    })
}

/// Shape a single-valued aggregation result.
pub fn metric_result(kind: AggregationKind, value: Option<f64>) -> Value {
    let value = value
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null);
    let mut map = Map::new();
    map.insert(kind.as_str().to_string(), value);
    Value::Object(map)
}

/// Shape a terms aggregation result.
pub fn terms_result(buckets: Vec<(Value, i64)>) -> Value {
    let buckets: Vec<Value> = buckets
        .into_iter()
        .map(|(key, count)| json!({ "key": key, "count": count }))
        .collect();
    json!({ "buckets": buckets })
}
