//! Search criteria passed to the entity search layer.
//!
//! A criteria is a mutable query descriptor. Filters and associations only
//! ever accumulate; nothing here resolves conflicting predicates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// A single filter predicate on an entity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Filter {
    /// `field == value`; a `null` value matches missing fields.
    Equals {
        field: String,
        #[schema(value_type = Object)]
        value: Value,
    },
    /// `field IN (values)`.
    EqualsAny {
        field: String,
        #[schema(value_type = Vec<Object>)]
        values: Vec<Value>,
    },
    /// Substring match on a text field.
    Contains { field: String, value: String },
    /// Bounded comparison on an orderable field.
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[schema(value_type = Option<Object>)]
        gte: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[schema(value_type = Option<Object>)]
        gt: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[schema(value_type = Option<Object>)]
        lte: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[schema(value_type = Option<Object>)]
        lt: Option<Value>,
    },
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Filter::Equals { field, .. }
            | Filter::EqualsAny { field, .. }
            | Filter::Contains { field, .. }
            | Filter::Range { field, .. } => field,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// Ordering on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Sorting {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// Supported aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    Count,
    Terms,
    Min,
    Max,
    Avg,
    Sum,
}

impl AggregationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationKind::Count => "count",
            AggregationKind::Terms => "terms",
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
            AggregationKind::Avg => "avg",
            AggregationKind::Sum => "sum",
        }
    }

    /// Whether the aggregation needs a numeric field.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            AggregationKind::Min | AggregationKind::Max | AggregationKind::Avg | AggregationKind::Sum
        )
    }
}

/// A named aggregation computed over the unpaginated result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Aggregation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AggregationKind,
    pub field: String,
}

/// Query descriptor for entity searches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    filters: Vec<Filter>,
    associations: BTreeSet<String>,
    ids: Vec<Uuid>,
    sorting: Vec<Sorting>,
    aggregations: Vec<Aggregation>,
    limit: Option<u32>,
    page: Option<u32>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the search to the given primary keys.
    pub fn with_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    pub fn add_filter(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Request eager loading of an association. Adding the same name twice is a no-op.
    pub fn add_association(&mut self, name: impl Into<String>) -> &mut Self {
        self.associations.insert(name.into());
        self
    }

    pub fn add_sorting(&mut self, sorting: Sorting) -> &mut Self {
        self.sorting.push(sorting);
        self
    }

    pub fn add_aggregation(&mut self, aggregation: Aggregation) -> &mut Self {
        self.aggregations.push(aggregation);
        self
    }

    pub fn set_limit(&mut self, limit: Option<u32>) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Set the 1-based page. Only meaningful together with a limit.
    pub fn set_page(&mut self, page: Option<u32>) -> &mut Self {
        self.page = page;
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn associations(&self) -> impl Iterator<Item = &str> {
        self.associations.iter().map(String::as_str)
    }

    pub fn has_association(&self, name: &str) -> bool {
        self.associations.contains(name)
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn sorting(&self) -> &[Sorting] {
        &self.sorting
    }

    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Number of rows to skip for the current page.
    pub fn offset(&self) -> u32 {
        match self.limit {
            Some(limit) => self.page().saturating_sub(1).saturating_mul(limit),
            None => 0,
        }
    }
}
