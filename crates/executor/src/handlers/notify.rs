use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use alertflow_core::{ActionKind, Alert, ChannelTarget, RouteAction};

use crate::context::ActionContext;
use crate::error::HandlerError;
use crate::registry::ActionHandler;

/// Contract for notification channel drivers.
///
/// Implementations deliver to real channels (chat, email, paging);
/// rendering of channel-specific bodies is their concern, not the
/// router's. Transient delivery failures should surface as
/// [`HandlerError::Downstream`] so the executor retries them.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify every member of a team.
    async fn notify_team(
        &self,
        team_id: &str,
        scope: Option<&str>,
        template_id: Option<&str>,
        alert: &Alert,
    ) -> Result<(), HandlerError>;

    /// Notify a single channel.
    async fn notify_channel(
        &self,
        target: &ChannelTarget,
        template_id: Option<&str>,
        alert: &Alert,
    ) -> Result<(), HandlerError>;

    /// Notify a single user.
    async fn notify_user(
        &self,
        user_id: &str,
        template_id: Option<&str>,
        channel_override: Option<&str>,
        alert: &Alert,
    ) -> Result<(), HandlerError>;

    /// Notify whoever is on call for a schedule.
    async fn notify_oncall(
        &self,
        schedule_id: &str,
        template_id: Option<&str>,
        level: Option<u32>,
        alert: &Alert,
    ) -> Result<(), HandlerError>;
}

/// Default notifier that records deliveries in the log stream.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_team(
        &self,
        team_id: &str,
        scope: Option<&str>,
        _template_id: Option<&str>,
        alert: &Alert,
    ) -> Result<(), HandlerError> {
        info!(team_id, scope, alert.id = %alert.id, "notify team");
        Ok(())
    }

    async fn notify_channel(
        &self,
        target: &ChannelTarget,
        _template_id: Option<&str>,
        alert: &Alert,
    ) -> Result<(), HandlerError> {
        info!(
            channel_type = %target.channel_type,
            channel_id = %target.channel_id,
            alert.id = %alert.id,
            "notify channel"
        );
        Ok(())
    }

    async fn notify_user(
        &self,
        user_id: &str,
        _template_id: Option<&str>,
        channel_override: Option<&str>,
        alert: &Alert,
    ) -> Result<(), HandlerError> {
        info!(user_id, channel_override, alert.id = %alert.id, "notify user");
        Ok(())
    }

    async fn notify_oncall(
        &self,
        schedule_id: &str,
        _template_id: Option<&str>,
        level: Option<u32>,
        alert: &Alert,
    ) -> Result<(), HandlerError> {
        info!(schedule_id, level, alert.id = %alert.id, "notify on-call");
        Ok(())
    }
}

/// Handler for NOTIFY_TEAM.
pub struct NotifyTeamHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyTeamHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ActionHandler for NotifyTeamHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::NotifyTeam
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::NotifyTeam {
            team_id,
            scope,
            template_id,
        } = action
        else {
            return Err(HandlerError::Rejected("not a NOTIFY_TEAM action".into()));
        };
        if team_id.is_empty() {
            return Err(HandlerError::MissingConfig("team_id is required".into()));
        }
        self.notifier
            .notify_team(team_id, scope.as_deref(), template_id.as_deref(), alert)
            .await?;
        Ok(format!("notified team {team_id}"))
    }
}

/// Handler for NOTIFY_CHANNEL.
pub struct NotifyChannelHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyChannelHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ActionHandler for NotifyChannelHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::NotifyChannel
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::NotifyChannel {
            target,
            template_id,
        } = action
        else {
            return Err(HandlerError::Rejected("not a NOTIFY_CHANNEL action".into()));
        };
        let Some(target) = target else {
            return Err(HandlerError::MissingConfig("target is required".into()));
        };
        self.notifier
            .notify_channel(target, template_id.as_deref(), alert)
            .await?;
        Ok(format!(
            "notified channel {}:{}",
            target.channel_type, target.channel_id
        ))
    }
}

/// Handler for NOTIFY_USER.
pub struct NotifyUserHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyUserHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ActionHandler for NotifyUserHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::NotifyUser
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::NotifyUser {
            user_id,
            template_id,
            channel_override,
        } = action
        else {
            return Err(HandlerError::Rejected("not a NOTIFY_USER action".into()));
        };
        if user_id.is_empty() {
            return Err(HandlerError::MissingConfig("user_id is required".into()));
        }
        self.notifier
            .notify_user(
                user_id,
                template_id.as_deref(),
                channel_override.as_deref(),
                alert,
            )
            .await?;
        Ok(format!("notified user {user_id}"))
    }
}

/// Handler for NOTIFY_ONCALL.
pub struct NotifyOncallHandler {
    notifier: Arc<dyn Notifier>,
}

impl NotifyOncallHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ActionHandler for NotifyOncallHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::NotifyOncall
    }

    async fn execute(
        &self,
        _ctx: &ActionContext,
        alert: &Alert,
        action: &RouteAction,
    ) -> Result<String, HandlerError> {
        let RouteAction::NotifyOncall {
            schedule_id,
            template_id,
            level,
        } = action
        else {
            return Err(HandlerError::Rejected("not a NOTIFY_ONCALL action".into()));
        };
        if schedule_id.is_empty() {
            return Err(HandlerError::MissingConfig("schedule_id is required".into()));
        }
        self.notifier
            .notify_oncall(schedule_id, template_id.as_deref(), *level, alert)
            .await?;
        Ok(format!("notified on-call for schedule {schedule_id}"))
    }
}
