use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::RouteAction;
use crate::condition::Condition;

/// A single daily window inside a [`TimeCondition`].
///
/// `start_time`/`end_time` are `HH:MM` strings compared minute-granular in
/// the condition's timezone. `end < start` denotes an overnight window that
/// spans midnight. An empty `days_of_week` matches every day; days are ISO
/// numbered (1 = Monday .. 7 = Sunday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub invert: bool,
}

/// Optional time gate on a rule: the rule can only match while at least one
/// window matches. No windows at all means the condition always matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeCondition {
    /// IANA timezone name; unknown names fall back to UTC.
    pub timezone: String,
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
}

/// A user-authored routing rule.
///
/// Conditions are AND-composed. Rules are evaluated in `(priority ASC,
/// created_at ASC)` order; a matching rule contributes its actions, and a
/// matching `terminal` rule stops evaluation of the remaining rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Lower numerical value is higher priority.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub time_condition: Option<TimeCondition>,
    #[serde(default)]
    pub actions: Vec<RouteAction>,
    /// A match stops further rule evaluation for this alert.
    #[serde(default)]
    pub terminal: bool,
    /// Filtering only; no effect on evaluation.
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
}

const fn default_enabled() -> bool {
    true
}

impl RoutingRule {
    /// Create an enabled rule with a generated id, priority 0, and
    /// timestamps of now.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            priority: 0,
            enabled: true,
            conditions: Vec::new(),
            time_condition: None,
            actions: Vec::new(),
            terminal: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            created_by: String::new(),
            updated_by: String::new(),
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Enable or disable the rule.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Append a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the time condition.
    #[must_use]
    pub fn with_time_condition(mut self, tc: TimeCondition) -> Self {
        self.time_condition = Some(tc);
        self
    }

    /// Append an action.
    #[must_use]
    pub fn with_action(mut self, action: RouteAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Mark the rule terminal.
    #[must_use]
    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    /// Set the creation instant (also used as the equal-priority tiebreak).
    #[must_use]
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// The total ordering key for evaluation: priority first, then creation
    /// time, then id so the order is stable even for simultaneous inserts.
    #[must_use]
    pub fn sort_key(&self) -> (i32, DateTime<Utc>, &str) {
        (self.priority, self.created_at, self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::condition::MatchOperator;

    use super::*;

    #[test]
    fn rule_defaults() {
        let rule = RoutingRule::new("route-critical");
        assert!(rule.enabled);
        assert!(!rule.terminal);
        assert_eq!(rule.priority, 0);
        assert!(rule.conditions.is_empty());
        assert!(!rule.id.is_empty());
    }

    #[test]
    fn sort_key_orders_by_priority_then_created_at() {
        let earlier = Utc::now() - Duration::hours(1);
        let a = RoutingRule::new("a").with_priority(1);
        let b = RoutingRule::new("b").with_priority(1).with_created_at(earlier);
        let c = RoutingRule::new("c").with_priority(0);

        let mut rules = vec![a.clone(), b.clone(), c.clone()];
        rules.sort_by(|x, y| x.sort_key().cmp(&y.sort_key()));
        assert_eq!(rules[0].name, "c");
        assert_eq!(rules[1].name, "b");
        assert_eq!(rules[2].name, "a");
    }

    #[test]
    fn rule_serde_roundtrip() {
        let rule = RoutingRule::new("r")
            .with_condition(crate::Condition::label(
                "severity",
                MatchOperator::Equals,
                "critical",
            ))
            .with_action(crate::RouteAction::notify_team("ops"))
            .with_terminal(true);
        let json = serde_json::to_string(&rule).unwrap();
        let back: RoutingRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, rule.id);
        assert_eq!(back.conditions.len(), 1);
        assert_eq!(back.actions.len(), 1);
        assert!(back.terminal);
    }

    #[test]
    fn enabled_defaults_to_true_when_absent() {
        let json = serde_json::json!({
            "id": "r1",
            "name": "bare",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        });
        let rule: RoutingRule = serde_json::from_value(json).unwrap();
        assert!(rule.enabled);
    }
}
