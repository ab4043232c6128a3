pub mod filter;
pub mod host;
pub mod moderation;

use twilight_model::{
    application::interaction::InteractionData,
    gateway::payload::incoming::{InteractionCreate, MessageCreate},
};

use kicker_core::Context;
use kicker_utils::COMMAND_PREFIX;

#[derive(Clone, Copy)]
enum InteractionRoute {
    KickConfirmation,
}

fn route_interaction(custom_id: &str) -> Option<InteractionRoute> {
    const ROUTES: [(&str, InteractionRoute); 1] = [(
        moderation::start_kicking::CUSTOM_ID_PREFIX,
        InteractionRoute::KickConfirmation,
    )];

    ROUTES
        .into_iter()
        .find_map(|(prefix, route)| custom_id.starts_with(prefix).then_some(route))
}

// Global command meta data
pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    moderation::start_kicking::META,
    moderation::stop_kicking::META,
    moderation::kick_status::META,
];

/// Split `!command arg1 rest...` into its lowercase command name, first
/// argument and remaining tail.
fn split_command(content: &str) -> Option<(String, Option<&str>, Option<&str>)> {
    let content = content.trim();
    let content = content.strip_prefix(COMMAND_PREFIX)?.trim();

    let mut command_and_rest = content.splitn(2, char::is_whitespace);
    let cmd = command_and_rest.next().unwrap_or("").to_ascii_lowercase();
    let rest = command_and_rest
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let (arg1, arg_tail) = match rest {
        Some(value) => {
            let mut args = value.splitn(2, char::is_whitespace);
            let first = args.next().filter(|arg| !arg.is_empty());
            let tail = args
                .next()
                .map(str::trim)
                .filter(|remaining| !remaining.is_empty());
            (first, tail)
        }
        None => (None, None),
    };

    Some((cmd, arg1, arg_tail))
}

pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    let content_owned = msg.content.clone();
    let Some((cmd, arg1, arg_tail)) = split_command(&content_owned) else {
        return Ok(());
    };

    match cmd.as_str() {
        "start-kicking" => moderation::start_kicking::run(ctx, msg, arg1, arg_tail).await?,
        "stop-kicking" => moderation::stop_kicking::run(ctx, msg).await?,
        "kick-status" => moderation::kick_status::run(ctx, msg).await?,
        _ => {}
    }

    Ok(())
}

pub async fn handle_interaction(
    ctx: Context,
    interaction: Box<InteractionCreate>,
) -> anyhow::Result<()> {
    let custom_id = match interaction.data.as_ref() {
        Some(InteractionData::MessageComponent(data)) => data.custom_id.clone(),
        _ => return Ok(()),
    };

    let Some(route) = route_interaction(&custom_id) else {
        return Ok(());
    };

    match route {
        InteractionRoute::KickConfirmation => {
            let _handled = moderation::confirm::handle_interaction(ctx, interaction).await?;
        }
    }

    Ok(())
}
