use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Target of a NOTIFY_CHANNEL action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelTarget {
    /// Channel family, e.g. `slack`, `webhook`, `email`.
    pub channel_type: String,
    /// Opaque channel identifier understood by the driver.
    pub channel_id: String,
}

/// Fieldless discriminant of [`RouteAction`], used as the handler-registry
/// key and in execution records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    NotifyTeam,
    NotifyChannel,
    NotifyUser,
    NotifyOncall,
    Suppress,
    Aggregate,
    Escalate,
    CreateTicket,
    SetLabel,
}

impl ActionKind {
    /// Return the canonical tag name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotifyTeam => "NOTIFY_TEAM",
            Self::NotifyChannel => "NOTIFY_CHANNEL",
            Self::NotifyUser => "NOTIFY_USER",
            Self::NotifyOncall => "NOTIFY_ONCALL",
            Self::Suppress => "SUPPRESS",
            Self::Aggregate => "AGGREGATE",
            Self::Escalate => "ESCALATE",
            Self::CreateTicket => "CREATE_TICKET",
            Self::SetLabel => "SET_LABEL",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A side-effecting instruction emitted by a matched rule.
///
/// Parameters are validated by the handler at execution time, not at parse
/// time: a missing required field produces a non-retryable failure result
/// rather than a deserialization error, so one malformed action cannot sink
/// a whole rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteAction {
    /// Notify every member of a team.
    NotifyTeam {
        #[serde(default)]
        team_id: String,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default)]
        template_id: Option<String>,
    },
    /// Notify a single channel.
    NotifyChannel {
        #[serde(default)]
        target: Option<ChannelTarget>,
        #[serde(default)]
        template_id: Option<String>,
    },
    /// Notify a single user.
    NotifyUser {
        #[serde(default)]
        user_id: String,
        #[serde(default)]
        template_id: Option<String>,
        #[serde(default)]
        channel_override: Option<String>,
    },
    /// Notify whoever is on call for a schedule.
    NotifyOncall {
        #[serde(default)]
        schedule_id: String,
        #[serde(default)]
        template_id: Option<String>,
        #[serde(default)]
        level: Option<u32>,
    },
    /// Silence the alert.
    Suppress {
        #[serde(default)]
        reason: String,
        #[serde(default)]
        duration_seconds: u64,
        #[serde(default)]
        log_suppression: bool,
    },
    /// Buffer the alert into an aggregation group.
    Aggregate {
        #[serde(default)]
        group_by: Vec<String>,
        #[serde(default)]
        window_seconds: u64,
        #[serde(default)]
        max_alerts: u32,
    },
    /// Start an escalation policy.
    Escalate {
        #[serde(default)]
        escalation_policy_id: String,
        #[serde(default)]
        start_at_step: u32,
        #[serde(default)]
        urgent: bool,
    },
    /// Open a ticket with an external provider.
    CreateTicket {
        #[serde(default)]
        provider_id: String,
        #[serde(default)]
        project_key: String,
        #[serde(default)]
        ticket_type: String,
        #[serde(default)]
        template_id: Option<String>,
        #[serde(default)]
        fields: HashMap<String, String>,
    },
    /// Add labels to the stored alert.
    SetLabel {
        #[serde(default)]
        labels: HashMap<String, String>,
        #[serde(default)]
        overwrite_existing: bool,
    },
}

impl RouteAction {
    /// The fieldless discriminant.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::NotifyTeam { .. } => ActionKind::NotifyTeam,
            Self::NotifyChannel { .. } => ActionKind::NotifyChannel,
            Self::NotifyUser { .. } => ActionKind::NotifyUser,
            Self::NotifyOncall { .. } => ActionKind::NotifyOncall,
            Self::Suppress { .. } => ActionKind::Suppress,
            Self::Aggregate { .. } => ActionKind::Aggregate,
            Self::Escalate { .. } => ActionKind::Escalate,
            Self::CreateTicket { .. } => ActionKind::CreateTicket,
            Self::SetLabel { .. } => ActionKind::SetLabel,
        }
    }

    /// A NOTIFY_TEAM action with only the team set.
    #[must_use]
    pub fn notify_team(team_id: impl Into<String>) -> Self {
        Self::NotifyTeam {
            team_id: team_id.into(),
            scope: None,
            template_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_serde_is_type_tagged() {
        let action = RouteAction::notify_team("ops");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "NOTIFY_TEAM");
        assert_eq!(json["team_id"], "ops");

        let back: RouteAction = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), ActionKind::NotifyTeam);
    }

    #[test]
    fn oncall_tag_name() {
        let action = RouteAction::NotifyOncall {
            schedule_id: "primary".into(),
            template_id: None,
            level: Some(1),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "NOTIFY_ONCALL");
    }

    #[test]
    fn missing_parameters_parse_to_defaults() {
        // A bare CREATE_TICKET parses; the handler decides it is invalid.
        let json = serde_json::json!({"type": "CREATE_TICKET"});
        let action: RouteAction = serde_json::from_value(json).unwrap();
        match action {
            RouteAction::CreateTicket { provider_id, fields, .. } => {
                assert!(provider_id.is_empty());
                assert!(fields.is_empty());
            }
            other => panic!("expected CreateTicket, got {other:?}"),
        }
    }

    #[test]
    fn every_kind_has_a_stable_tag() {
        let kinds = [
            ActionKind::NotifyTeam,
            ActionKind::NotifyChannel,
            ActionKind::NotifyUser,
            ActionKind::NotifyOncall,
            ActionKind::Suppress,
            ActionKind::Aggregate,
            ActionKind::Escalate,
            ActionKind::CreateTicket,
            ActionKind::SetLabel,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
