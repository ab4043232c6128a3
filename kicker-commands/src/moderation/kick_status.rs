use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::moderation::messages::{GUILD_ONLY_MESSAGE, NOTHING_RUNNING_MESSAGE, status_message};
use kicker_core::Context;

pub const META: CommandMeta = CommandMeta {
    name: "kick-status",
    desc: "Show progress of the kick session running in this server.",
    category: "moderation",
    usage: "!kick-status",
};

pub async fn run(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    let http = &ctx.http;
    let Some(guild_id) = msg.guild_id else {
        http.create_message(msg.channel_id)
            .content(GUILD_ONLY_MESSAGE)
            .await?;
        return Ok(());
    };

    let content = match ctx.purge.status(guild_id).await {
        Some(report) => status_message(&report),
        None => NOTHING_RUNNING_MESSAGE.to_owned(),
    };
    http.create_message(msg.channel_id).content(&content).await?;

    Ok(())
}
