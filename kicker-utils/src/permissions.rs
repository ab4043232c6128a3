use twilight_http::Client;
use twilight_model::id::{
    Id,
    marker::{GuildMarker, UserMarker},
};

/// Resolve the owner of a guild.
pub async fn guild_owner_id(
    http: &Client,
    guild_id: Id<GuildMarker>,
) -> anyhow::Result<Id<UserMarker>> {
    let guild = http.guild(guild_id).await?.model().await?;
    Ok(guild.owner_id)
}

/// Check whether `user_id` owns the guild. Kick sessions are owner-only.
pub async fn is_guild_owner(
    http: &Client,
    guild_id: Id<GuildMarker>,
    user_id: Id<UserMarker>,
) -> anyhow::Result<bool> {
    Ok(guild_owner_id(http, guild_id).await? == user_id)
}
