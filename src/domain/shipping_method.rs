//! Shipping method entities as exposed by the store API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::SalesChannelContext;

/// Media file attached to a shipping method (typically a carrier logo).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    pub mime_type: String,
    pub file_name: String,
}

/// Compact view of the rule deciding whether a shipping method is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub id: Uuid,
    pub name: String,
    pub priority: i64,
}

/// A shipping method of a sales channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub position: i64,
    pub media_id: Option<Uuid>,
    pub availability_rule_id: Option<Uuid>,
    /// Populated only when the `media` association was requested.
    pub media: Option<Media>,
    /// Populated only when the `availabilityRule` association was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_rule: Option<AvailabilityRule>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "api_alias")]
    pub api_alias: String,
}

fn api_alias() -> String {
    "shipping_method".to_string()
}

impl ShippingMethod {
    /// Create a new active shipping method without associations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            active: true,
            position: 1,
            media_id: None,
            availability_rule_id: None,
            media: None,
            availability_rule: None,
            created_at: Utc::now(),
            api_alias: api_alias(),
        }
    }

    pub fn with_availability_rule(mut self, rule_id: Uuid) -> Self {
        self.availability_rule_id = Some(rule_id);
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether the availability rule of this method is active in the context.
    ///
    /// A method without an availability rule is never available.
    pub fn is_available_in(&self, context: &SalesChannelContext) -> bool {
        self.availability_rule_id
            .is_some_and(|rule_id| context.rule_ids.contains(&rule_id))
    }
}

/// Ordered list of shipping methods returned by a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingMethodCollection(Vec<ShippingMethod>);

impl ShippingMethodCollection {
    pub fn new(methods: Vec<ShippingMethod>) -> Self {
        Self(methods)
    }

    /// Keep only the methods whose availability rule is active for the context.
    ///
    /// Relative order is preserved.
    pub fn filter_by_active_rules(self, context: &SalesChannelContext) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|method| method.is_available_in(context))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShippingMethod> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ShippingMethod> {
        self.0.iter_mut()
    }

    pub fn into_inner(self) -> Vec<ShippingMethod> {
        self.0
    }
}

impl FromIterator<ShippingMethod> for ShippingMethodCollection {
    fn from_iter<I: IntoIterator<Item = ShippingMethod>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SalesChannel;

    fn context_with_rules(rule_ids: Vec<Uuid>) -> SalesChannelContext {
        SalesChannelContext::new(SalesChannel::new("Storefront"), rule_ids)
    }

    #[test]
    fn test_filter_by_active_rules_keeps_matching_in_order() {
        let express_rule = Uuid::new_v4();
        let pickup_rule = Uuid::new_v4();
        let collection = ShippingMethodCollection::new(vec![
            ShippingMethod::new("Standard").with_availability_rule(Uuid::new_v4()),
            ShippingMethod::new("Express").with_availability_rule(express_rule),
            ShippingMethod::new("No rule"),
            ShippingMethod::new("Pickup").with_availability_rule(pickup_rule),
        ]);

        let filtered =
            collection.filter_by_active_rules(&context_with_rules(vec![pickup_rule, express_rule]));

        let names: Vec<_> = filtered.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Express", "Pickup"]);
    }

    #[test]
    fn test_method_without_rule_is_unavailable() {
        let method = ShippingMethod::new("Freight");
        assert!(!method.is_available_in(&context_with_rules(vec![Uuid::new_v4()])));
    }

    #[test]
    fn test_serializes_camel_case_with_alias() {
        let method = ShippingMethod::new("Standard");
        let json = serde_json::to_value(&method).unwrap();

        assert_eq!(json["apiAlias"], "shipping_method");
        assert!(json.get("availabilityRuleId").is_some());
        assert!(json["media"].is_null());
        assert!(json.get("availabilityRule").is_none());
    }
}
