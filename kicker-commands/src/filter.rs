//! Candidate selection for `!start-kicking`.

use twilight_http::Client;
use twilight_model::{
    guild::Member,
    id::{
        Id,
        marker::{GuildMarker, RoleMarker, UserMarker},
    },
};

use kicker_core::{CandidateFilter, Target};

const MEMBER_PAGE_SIZE: u16 = 1000;

/// Selects members that joined before a cutoff and either hold `role` or,
/// without a role, hold no roles at all. The guild owner and the bot itself
/// are never selected.
#[derive(Clone, Copy, Debug)]
pub struct MemberFilter {
    pub joined_before_secs: i64,
    pub role: Option<Id<RoleMarker>>,
    pub owner_id: Id<UserMarker>,
    pub bot_id: Id<UserMarker>,
}

impl MemberFilter {
    pub fn admits(
        &self,
        user_id: Id<UserMarker>,
        roles: &[Id<RoleMarker>],
        joined_at_secs: Option<i64>,
    ) -> bool {
        let role_matches = match self.role {
            Some(role) => roles.contains(&role),
            None => roles.is_empty(),
        };
        let joined_early = joined_at_secs.is_some_and(|joined| joined < self.joined_before_secs);

        role_matches && joined_early && user_id != self.owner_id && user_id != self.bot_id
    }
}

impl CandidateFilter<Member> for MemberFilter {
    fn select(&self, candidates: &[Member]) -> Vec<Target> {
        candidates
            .iter()
            .filter(|member| {
                self.admits(
                    member.user.id,
                    &member.roles,
                    member.joined_at.map(|joined| joined.as_secs()),
                )
            })
            .map(|member| Target::new(member.user.id, display_name(member)))
            .collect()
    }
}

/// Nickname, then global name, then username.
pub fn display_name(member: &Member) -> String {
    member
        .nick
        .clone()
        .or_else(|| member.user.global_name.clone())
        .unwrap_or_else(|| member.user.name.clone())
}

/// Fetch every member of a guild, page by page.
pub async fn fetch_guild_members(
    http: &Client,
    guild_id: Id<GuildMarker>,
) -> anyhow::Result<Vec<Member>> {
    let mut members = Vec::new();
    let mut after: Option<Id<UserMarker>> = None;

    loop {
        let request = http.guild_members(guild_id).limit(MEMBER_PAGE_SIZE);
        let response = match after {
            Some(after_id) => request.after(after_id).await?,
            None => request.await?,
        };
        let page = response.model().await?;

        let page_len = page.len();
        after = page.last().map(|member| member.user.id);
        members.extend(page);

        if page_len < usize::from(MEMBER_PAGE_SIZE) {
            break;
        }
    }

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUTOFF: i64 = 1_700_000_000;

    fn filter(role: Option<u64>) -> MemberFilter {
        MemberFilter {
            joined_before_secs: CUTOFF,
            role: role.map(Id::new),
            owner_id: Id::new(1),
            bot_id: Id::new(2),
        }
    }

    #[test]
    fn without_role_only_roleless_members_are_admitted() {
        let filter = filter(None);

        assert!(filter.admits(Id::new(10), &[], Some(CUTOFF - 60)));
        assert!(!filter.admits(Id::new(10), &[Id::new(5)], Some(CUTOFF - 60)));
    }

    #[test]
    fn with_role_only_holders_are_admitted() {
        let filter = filter(Some(5));

        assert!(filter.admits(Id::new(10), &[Id::new(4), Id::new(5)], Some(CUTOFF - 60)));
        assert!(!filter.admits(Id::new(10), &[Id::new(4)], Some(CUTOFF - 60)));
        assert!(!filter.admits(Id::new(10), &[], Some(CUTOFF - 60)));
    }

    #[test]
    fn recent_or_unknown_joins_are_skipped() {
        let filter = filter(None);

        assert!(!filter.admits(Id::new(10), &[], Some(CUTOFF)));
        assert!(!filter.admits(Id::new(10), &[], Some(CUTOFF + 60)));
        assert!(!filter.admits(Id::new(10), &[], None));
    }

    #[test]
    fn owner_and_bot_are_never_admitted() {
        let filter = filter(None);

        assert!(!filter.admits(Id::new(1), &[], Some(0)));
        assert!(!filter.admits(Id::new(2), &[], Some(0)));
    }
}
