use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::moderation::messages::{
    GUILD_ONLY_MESSAGE, NOTHING_RUNNING_MESSAGE, OWNER_ONLY_MESSAGE, cancelling_message,
};
use kicker_core::{Context, StopOutcome};
use kicker_utils::permissions::is_guild_owner;

pub const META: CommandMeta = CommandMeta {
    name: "stop-kicking",
    desc: "Cancel the kick session running in this server.",
    category: "moderation",
    usage: "!stop-kicking",
};

/// Cancel the running kick session. Members already kicked stay kicked.
pub async fn run(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let Some(guild_id) = msg.guild_id else {
        http.create_message(msg.channel_id)
            .content(GUILD_ONLY_MESSAGE)
            .await?;
        return Ok(());
    };

    if !is_guild_owner(http, guild_id, msg.author.id).await? {
        http.create_message(msg.channel_id)
            .content(OWNER_ONLY_MESSAGE)
            .await?;
        return Ok(());
    }

    match ctx.purge.stop(guild_id).await {
        StopOutcome::NothingRunning => {
            http.create_message(msg.channel_id)
                .content(NOTHING_RUNNING_MESSAGE)
                .await?;
        }
        StopOutcome::Stopped(report) => {
            info!(
                guild_id = guild_id.get(),
                session = %report.session,
                "kick session stopped by owner"
            );
            let content = cancelling_message(report.mode);
            http.create_message(msg.channel_id).content(&content).await?;
        }
    }

    Ok(())
}
