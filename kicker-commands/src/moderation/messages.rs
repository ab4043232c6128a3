//! User-facing text for kick sessions.
//!
//! Pure string templates; nothing here performs HTTP requests.

use kicker_core::{RunMode, SessionReport, Target};

/// Discord's message content limit.
pub const MESSAGE_LIMIT: usize = 2000;
const TRUNCATED_NOTICE: &str = "\n... (truncated)";

pub const GUILD_ONLY_MESSAGE: &str = "This command only works in servers.";
pub const OWNER_ONLY_MESSAGE: &str = "Only the Guild Owner may use this command.";
pub const ALREADY_RUNNING_MESSAGE: &str =
    "This is already running. Use `!stop-kicking` to stop progress.";
pub const NOTHING_RUNNING_MESSAGE: &str = "There is no current kick running.";
pub const INVALID_DURATION_MESSAGE: &str = "joined_after must be in the format of 1w2d3h4m5s";
pub const STALE_CONFIRMATION_MESSAGE: &str =
    "This confirmation is no longer valid. Run `!start-kicking` again.";

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{usage}`")
}

/// Numbered member list under `header`, cut to fit one message.
pub fn member_list(header: &str, members: &[Target]) -> String {
    let mut text = header.to_owned();
    if !members.is_empty() {
        text.push_str("\n\n");
    }

    for (index, member) in members.iter().enumerate() {
        if index > 0 {
            text.push('\n');
        }
        text.push_str(&format!(
            "{}. {}",
            index + 1,
            member.display_name.replace('@', "@\u{200B}")
        ));
    }

    truncate_to_limit(text, MESSAGE_LIMIT)
}

fn truncate_to_limit(mut text: String, limit: usize) -> String {
    if text.len() <= limit {
        return text;
    }

    let mut cut = limit.saturating_sub(TRUNCATED_NOTICE.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(TRUNCATED_NOTICE);
    text
}

fn mode_prefix(mode: RunMode) -> String {
    match mode {
        RunMode::Live => String::new(),
        RunMode::Simulated => format!("{} ", mode.label()),
    }
}

pub fn confirmation_message(
    mode: RunMode,
    targets: &[Target],
    joined_after: &str,
    role: Option<u64>,
) -> String {
    let role = role.map_or_else(|| "No Roles Assigned".to_owned(), |id| format!("<@&{id}>"));
    let header = format!(
        "Calculated {}Kicking {} members from the Guild. Click Start to continue.\nJoined After: {joined_after}\nRole: {role}",
        mode_prefix(mode),
        targets.len(),
    );
    member_list(&header, targets)
}

pub fn completion_message(report: &SessionReport) -> String {
    let mut header = format!(
        "**{}**\nKicked {} member(s)",
        report.status_line(),
        report.removed.len()
    );
    if let Some(failure) = report.failure.as_deref() {
        header.push_str(&format!("\nStopped by an error: {failure}"));
    }
    member_list(&header, &report.removed)
}

pub fn cancelling_message(mode: RunMode) -> String {
    format!("Cancelling {}Kick Session", mode_prefix(mode))
}

pub fn status_message(report: &SessionReport) -> String {
    format!(
        "{}\nKicked {} of {} member(s), {} remaining.",
        report.status_line(),
        report.removed.len(),
        report.total,
        report.remaining()
    )
}

#[cfg(test)]
mod tests {
    use kicker_core::{SessionId, SessionState};
    use twilight_model::id::Id;

    use super::*;

    fn members(count: u64) -> Vec<Target> {
        (1..=count)
            .map(|id| Target::new(Id::new(id), format!("member-{id}")))
            .collect()
    }

    fn report(state: SessionState, removed: Vec<Target>, total: usize) -> SessionReport {
        SessionReport {
            session: SessionId::new(1),
            scope: Id::new(9),
            origin: None,
            mode: RunMode::Simulated,
            state,
            total,
            removed,
            failure: None,
        }
    }

    #[test]
    fn member_list_is_numbered() {
        let text = member_list("Header", &members(2));
        assert_eq!(text, "Header\n\n1. member-1\n2. member-2");
    }

    #[test]
    fn long_member_list_is_truncated() {
        let text = member_list("Header", &members(500));

        assert!(text.len() <= MESSAGE_LIMIT);
        assert!(text.ends_with(TRUNCATED_NOTICE));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = truncate_to_limit("é".repeat(MESSAGE_LIMIT), MESSAGE_LIMIT);

        assert!(text.len() <= MESSAGE_LIMIT);
        assert!(text.ends_with(TRUNCATED_NOTICE));
    }

    #[test]
    fn mentions_in_names_are_neutralised() {
        let text = member_list("Header", &[Target::new(Id::new(1), "@everyone")]);
        assert!(!text.contains("@everyone"));
    }

    #[test]
    fn completion_message_names_outcome() {
        let text = completion_message(&report(SessionState::Cancelled, members(1), 3));

        assert!(text.starts_with("**Simulated Kick Session was Cancelled**\nKicked 1 member(s)"));
        assert!(text.ends_with("1. member-1"));
    }

    #[test]
    fn status_message_counts_progress() {
        let text = status_message(&report(SessionState::Running, members(2), 5));
        assert_eq!(
            text,
            "Simulated Kick Session is Running\nKicked 2 of 5 member(s), 3 remaining."
        );
    }

    #[test]
    fn live_mode_has_no_prefix() {
        assert_eq!(cancelling_message(RunMode::Live), "Cancelling Kick Session");
        assert_eq!(
            cancelling_message(RunMode::Simulated),
            "Cancelling Simulated Kick Session"
        );
    }
}
