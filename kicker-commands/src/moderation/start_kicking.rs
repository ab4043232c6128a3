use std::sync::Arc;

use tracing::info;
use twilight_model::gateway::payload::incoming::MessageCreate;

use crate::CommandMeta;
use crate::filter::{MemberFilter, fetch_guild_members};
use crate::host::ChannelPrompt;
use crate::moderation::messages::{
    ALREADY_RUNNING_MESSAGE, GUILD_ONLY_MESSAGE, INVALID_DURATION_MESSAGE, OWNER_ONLY_MESSAGE,
    confirmation_message, usage_message,
};
use kicker_core::{BeginOutcome, Context, PurgeRequest};
use kicker_utils::interaction::{build_confirmation_components, build_confirmation_custom_ids};
use kicker_utils::parse::{parse_duration_seconds, parse_role_id};
use kicker_utils::permissions::guild_owner_id;
use kicker_utils::time::now_unix_secs;

pub const META: CommandMeta = CommandMeta {
    name: "start-kicking",
    desc: "Kick every member that joined before a cutoff, optionally only those with a role.",
    category: "moderation",
    usage: "!start-kicking [joined_after=24h] [role]",
};

/// Prefix of the Start/Cancel button custom IDs.
pub const CUSTOM_ID_PREFIX: &str = "kick:";
/// Audit log reason attached to every kick.
pub const AUDIT_LOG_REASON: &str = "!start-kicking command was used";
const DEFAULT_JOINED_AFTER: &str = "24h";

/// Build the kick list and post a confirmation prompt.
///
/// Nothing is kicked until the requester presses Start.
pub async fn run(
    ctx: Context,
    msg: Box<MessageCreate>,
    arg1: Option<&str>,
    arg_tail: Option<&str>,
) -> anyhow::Result<()> {
    let http = &ctx.http;
    let Some(guild_id) = msg.guild_id else {
        http.create_message(msg.channel_id)
            .content(GUILD_ONLY_MESSAGE)
            .await?;
        return Ok(());
    };

    let owner_id = guild_owner_id(http, guild_id).await?;
    if owner_id != msg.author.id {
        http.create_message(msg.channel_id)
            .content(OWNER_ONLY_MESSAGE)
            .await?;
        return Ok(());
    }

    let joined_after = arg1.unwrap_or(DEFAULT_JOINED_AFTER);
    let Some(joined_after_secs) = parse_duration_seconds(joined_after) else {
        http.create_message(msg.channel_id)
            .content(INVALID_DURATION_MESSAGE)
            .await?;
        return Ok(());
    };

    let role = match arg_tail {
        Some(raw_role) => {
            let Some(role_id) = parse_role_id(raw_role) else {
                let usage = usage_message(META.usage);
                http.create_message(msg.channel_id).content(&usage).await?;
                return Ok(());
            };
            // @everyone shares the guild's id and means "no role filter".
            (role_id.get() != guild_id.get()).then_some(role_id)
        }
        None => None,
    };

    if ctx.purge.is_running(guild_id).await {
        http.create_message(msg.channel_id)
            .content(ALREADY_RUNNING_MESSAGE)
            .await?;
        return Ok(());
    }

    let bot_id = http.current_user().await?.model().await?.id;
    let cutoff = now_unix_secs().saturating_sub(joined_after_secs);
    let filter = MemberFilter {
        joined_before_secs: i64::try_from(cutoff).unwrap_or(i64::MAX),
        role,
        owner_id,
        bot_id,
    };

    let members = fetch_guild_members(http, guild_id).await?;
    let request = PurgeRequest::new(guild_id, Vec::new(), AUDIT_LOG_REASON).origin(msg.channel_id);
    let session = ctx.purge.prepare_from(request, &members, &filter);

    let (confirm_custom_id, decline_custom_id) = build_confirmation_custom_ids(
        CUSTOM_ID_PREFIX,
        msg.author.id.get(),
        session.id().get(),
    );
    let components = build_confirmation_components(confirm_custom_id, decline_custom_id);
    let content = confirmation_message(
        session.mode(),
        session.targets(),
        joined_after,
        role.map(|role_id| role_id.get()),
    );

    let prompt_message = http
        .create_message(msg.channel_id)
        .content(&content)
        .components(&components)
        .await?
        .model()
        .await?;

    info!(
        guild_id = guild_id.get(),
        session = %session.id(),
        candidates = members.len(),
        targets = session.targets().len(),
        "kick session prepared"
    );

    let prompt = ChannelPrompt::new(Arc::clone(&ctx.http), msg.channel_id, prompt_message.id);
    if ctx.purge.begin(session, Box::new(prompt)).await == BeginOutcome::AlreadyRunning {
        http.create_message(msg.channel_id)
            .content(ALREADY_RUNNING_MESSAGE)
            .await?;
    }

    Ok(())
}
