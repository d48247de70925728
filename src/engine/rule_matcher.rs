//! Rule Matcher - decides which business rules hold for a request context.
//!
//! The ids of the matching rules end up in `SalesChannelContext::rule_ids`,
//! which availability checks (e.g. of shipping methods) are evaluated against.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Rule, RuleCondition, SalesChannelContext};

/// Trait for rule matcher implementations.
pub trait RuleMatcher: Send + Sync {
    /// Return the ids of all rules valid for the context, highest priority first.
    fn match_rules(&self, rules: &[Rule], context: &SalesChannelContext) -> Vec<Uuid>;
}

/// Evaluates the fixed set of [`RuleCondition`] types against a context.
#[derive(Debug, Default, Clone)]
pub struct ConditionRuleMatcher;

impl ConditionRuleMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Same as [`RuleMatcher::match_rules`] with an explicit clock.
    pub fn match_rules_at(
        &self,
        rules: &[Rule],
        context: &SalesChannelContext,
        now: DateTime<Utc>,
    ) -> Vec<Uuid> {
        let mut matched: Vec<&Rule> = rules
            .iter()
            .filter(|rule| {
                rule.conditions
                    .iter()
                    .all(|condition| Self::condition_matches(condition, context, now))
            })
            .collect();

        matched.sort_by(|a, b| b.priority.cmp(&a.priority));

        tracing::debug!(
            sales_channel_id = %context.sales_channel_id(),
            evaluated = rules.len(),
            matched = matched.len(),
            "Rule matching complete"
        );

        matched.into_iter().map(|rule| rule.id).collect()
    }

    fn condition_matches(
        condition: &RuleCondition,
        context: &SalesChannelContext,
        now: DateTime<Utc>,
    ) -> bool {
        match condition {
            RuleCondition::AlwaysValid => true,
            RuleCondition::SalesChannel { ids } => ids.contains(&context.sales_channel_id()),
            RuleCondition::Currency { ids } => ids.contains(&context.currency_id),
            RuleCondition::Language { ids } => ids.contains(&context.language_id),
            RuleCondition::CustomerLoggedIn { value } => context.is_customer_logged_in() == *value,
            RuleCondition::DateRange { from, to } => {
                from.map_or(true, |from| now >= from) && to.map_or(true, |to| now <= to)
            }
        }
    }
}

impl RuleMatcher for ConditionRuleMatcher {
    fn match_rules(&self, rules: &[Rule], context: &SalesChannelContext) -> Vec<Uuid> {
        self.match_rules_at(rules, context, Utc::now())
    }
}
