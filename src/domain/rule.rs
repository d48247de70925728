//! Business rules used for availability checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A single condition of a rule. All conditions of a rule must match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleCondition {
    AlwaysValid,
    SalesChannel { ids: Vec<Uuid> },
    Currency { ids: Vec<Uuid> },
    Language { ids: Vec<Uuid> },
    CustomerLoggedIn { value: bool },
    /// Inclusive date window; an open bound matches any time on that side.
    DateRange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<DateTime<Utc>>,
    },
}

/// A named, prioritised set of conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Rule {
    pub id: Uuid,
    pub name: String,
    pub priority: i64,
    pub conditions: Vec<RuleCondition>,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(name: impl Into<String>, priority: i64, conditions: Vec<RuleCondition>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            priority,
            conditions,
            created_at: Utc::now(),
        }
    }
}
