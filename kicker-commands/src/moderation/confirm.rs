use tracing::{debug, info};
use twilight_model::{
    application::interaction::InteractionData, gateway::payload::incoming::InteractionCreate,
};

use crate::moderation::messages::{
    ALREADY_RUNNING_MESSAGE, GUILD_ONLY_MESSAGE, STALE_CONFIRMATION_MESSAGE,
};
use crate::moderation::start_kicking::CUSTOM_ID_PREFIX;
use kicker_core::{ConfirmOutcome, Context, SessionId};
use kicker_utils::interaction::{
    ConfirmationAction, defer_component_update, followup_ephemeral,
    parse_confirmation_custom_id, respond_ephemeral_notice,
};

/// Handle the Start/Cancel buttons of a kick confirmation prompt.
///
/// Returns `Ok(false)` when the interaction is not a kick confirmation.
pub async fn handle_interaction(
    ctx: Context,
    interaction: Box<InteractionCreate>,
) -> anyhow::Result<bool> {
    let http = &ctx.http;

    let Some(InteractionData::MessageComponent(component_data)) = interaction.data.as_ref() else {
        return Ok(false);
    };

    if !component_data.custom_id.starts_with(CUSTOM_ID_PREFIX) {
        return Ok(false);
    }

    let Some(parsed) = parse_confirmation_custom_id(&component_data.custom_id, CUSTOM_ID_PREFIX)
    else {
        respond_ephemeral_notice(http, &interaction, "Invalid kick confirmation.").await?;
        return Ok(true);
    };

    let Some(actor_id) = interaction.author_id().map(|id| id.get()) else {
        respond_ephemeral_notice(http, &interaction, "Unable to determine interaction user.")
            .await?;
        return Ok(true);
    };

    if actor_id != parsed.requester_id {
        respond_ephemeral_notice(
            http,
            &interaction,
            "Only the user who started this kick session can confirm it.",
        )
        .await?;
        return Ok(true);
    }

    let Some(guild_id) = interaction.guild_id else {
        respond_ephemeral_notice(http, &interaction, GUILD_ONLY_MESSAGE).await?;
        return Ok(true);
    };

    defer_component_update(http, &interaction).await?;
    let session = SessionId::new(parsed.session_id);

    match parsed.action {
        ConfirmationAction::Decline => {
            if ctx.purge.decline(guild_id, session).await {
                debug!(guild_id = guild_id.get(), %session, "kick session declined");
            } else {
                followup_ephemeral(http, &interaction, STALE_CONFIRMATION_MESSAGE).await?;
            }
        }
        ConfirmationAction::Confirm => match ctx.purge.confirm(guild_id, session).await? {
            ConfirmOutcome::Started(started) => {
                info!(guild_id = guild_id.get(), session = %started, "kick session confirmed");
            }
            ConfirmOutcome::AlreadyRunning => {
                followup_ephemeral(http, &interaction, ALREADY_RUNNING_MESSAGE).await?;
            }
            ConfirmOutcome::Stale => {
                followup_ephemeral(http, &interaction, STALE_CONFIRMATION_MESSAGE).await?;
            }
        },
    }

    Ok(true)
}
