use twilight_http::Client;
use twilight_model::{
    channel::message::{
        MessageFlags,
        component::{ActionRow, Button, ButtonStyle, Component},
    },
    gateway::payload::incoming::InteractionCreate,
    http::interaction::{InteractionResponse, InteractionResponseType},
};
use twilight_util::builder::InteractionResponseDataBuilder;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfirmationAction {
    Confirm,
    Decline,
}

/// Data carried by a kick confirmation button.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParsedConfirmation {
    pub action: ConfirmationAction,
    pub requester_id: u64,
    pub session_id: u64,
}

pub fn build_confirmation_custom_id(
    prefix: &str,
    action: ConfirmationAction,
    requester_id: u64,
    session_id: u64,
) -> String {
    let action_segment = match action {
        ConfirmationAction::Confirm => "confirm",
        ConfirmationAction::Decline => "decline",
    };

    format!("{prefix}{action_segment}:{requester_id}:{session_id}")
}

pub fn build_confirmation_custom_ids(
    prefix: &str,
    requester_id: u64,
    session_id: u64,
) -> (String, String) {
    (
        build_confirmation_custom_id(prefix, ConfirmationAction::Confirm, requester_id, session_id),
        build_confirmation_custom_id(prefix, ConfirmationAction::Decline, requester_id, session_id),
    )
}

/// Start/Cancel button row for a kick confirmation prompt.
pub fn build_confirmation_components(
    confirm_custom_id: String,
    decline_custom_id: String,
) -> Vec<Component> {
    vec![Component::ActionRow(ActionRow {
        id: None,
        components: vec![
            Component::Button(Button {
                id: None,
                custom_id: Some(confirm_custom_id),
                disabled: false,
                emoji: None,
                label: Some("Start".to_owned()),
                style: ButtonStyle::Danger,
                url: None,
                sku_id: None,
            }),
            Component::Button(Button {
                id: None,
                custom_id: Some(decline_custom_id),
                disabled: false,
                emoji: None,
                label: Some("Cancel".to_owned()),
                style: ButtonStyle::Secondary,
                url: None,
                sku_id: None,
            }),
        ],
    })]
}

pub fn parse_confirmation_custom_id(custom_id: &str, prefix: &str) -> Option<ParsedConfirmation> {
    let raw = custom_id.strip_prefix(prefix)?;
    let mut parts = raw.split(':');

    let action = match parts.next()? {
        "confirm" => ConfirmationAction::Confirm,
        "decline" => ConfirmationAction::Decline,
        _ => return None,
    };

    let requester_id = parts.next()?.parse::<u64>().ok()?;
    let session_id = parts.next()?.parse::<u64>().ok()?;

    if parts.next().is_some() {
        return None;
    }

    Some(ParsedConfirmation {
        action,
        requester_id,
        session_id,
    })
}

/// Respond to a component interaction with an ephemeral message.
pub async fn respond_ephemeral_notice(
    http: &Client,
    interaction: &InteractionCreate,
    content: &str,
) -> anyhow::Result<()> {
    let response = InteractionResponse {
        kind: InteractionResponseType::ChannelMessageWithSource,
        data: Some(
            InteractionResponseDataBuilder::new()
                .content(content)
                .flags(MessageFlags::EPHEMERAL)
                .build(),
        ),
    };

    http.interaction(interaction.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await?;

    Ok(())
}

pub async fn defer_component_update(
    http: &Client,
    interaction: &InteractionCreate,
) -> anyhow::Result<()> {
    let response = InteractionResponse {
        kind: InteractionResponseType::DeferredUpdateMessage,
        data: None,
    };

    http.interaction(interaction.application_id)
        .create_response(interaction.id, &interaction.token, &response)
        .await?;

    Ok(())
}

/// Send an ephemeral follow-up after the interaction has been deferred.
pub async fn followup_ephemeral(
    http: &Client,
    interaction: &InteractionCreate,
    content: &str,
) -> anyhow::Result<()> {
    http.interaction(interaction.application_id)
        .create_followup(&interaction.token)
        .content(content)
        .flags(MessageFlags::EPHEMERAL)
        .await?;

    Ok(())
}
