//! twilight-backed collaborators for the kick session engine.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};
use twilight_http::{Client, error::ErrorType, request::AuditLogReason as _};
use twilight_model::id::{
    Id,
    marker::{ChannelMarker, MessageMarker},
};

use crate::moderation::messages::completion_message;
use kicker_core::{
    ActionExecutor, CompletionSink, PromptError, PromptSurface, ScopeKey, SessionReport, Target,
};

/// Kicks guild members with an audit log reason.
pub struct GuildMemberKicker {
    http: Arc<Client>,
}

impl GuildMemberKicker {
    pub fn new(http: Arc<Client>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ActionExecutor for GuildMemberKicker {
    async fn remove(&self, scope: ScopeKey, target: &Target, reason: &str) -> anyhow::Result<()> {
        self.http
            .remove_guild_member(scope, target.id)
            .reason(reason)
            .await?;

        Ok(())
    }
}

/// The bot's confirmation message in a channel.
pub struct ChannelPrompt {
    http: Arc<Client>,
    channel_id: Id<ChannelMarker>,
    message_id: Id<MessageMarker>,
}

impl ChannelPrompt {
    pub fn new(
        http: Arc<Client>,
        channel_id: Id<ChannelMarker>,
        message_id: Id<MessageMarker>,
    ) -> Self {
        Self {
            http,
            channel_id,
            message_id,
        }
    }
}

#[async_trait]
impl PromptSurface for ChannelPrompt {
    async fn dismiss(&self) -> Result<(), PromptError> {
        match self
            .http
            .delete_message(self.channel_id, self.message_id)
            .await
        {
            Ok(_) => Ok(()),
            Err(source) if is_not_found(&source) => Err(PromptError::Gone),
            Err(source) => Err(PromptError::Other(source.into())),
        }
    }
}

fn is_not_found(source: &twilight_http::Error) -> bool {
    matches!(source.kind(), ErrorType::Response { status, .. } if status.get() == 404)
}

/// Posts the final session summary to the channel that requested it.
pub struct ChannelNotifier {
    http: Arc<Client>,
}

impl ChannelNotifier {
    pub fn new(http: Arc<Client>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CompletionSink for ChannelNotifier {
    async fn session_finished(&self, report: &SessionReport, was_cancelled: bool) {
        info!(
            guild_id = report.scope.get(),
            session = %report.session,
            kicked = report.removed.len(),
            was_cancelled,
            "kick session summary"
        );

        let Some(channel_id) = report.origin else {
            debug!(session = %report.session, "no origin channel for kick session summary");
            return;
        };

        let content = completion_message(report);
        if let Err(source) = self.http.create_message(channel_id).content(&content).await {
            error!(?source, session = %report.session, "failed to post kick session summary");
        }
    }
}
