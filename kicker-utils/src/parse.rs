use twilight_model::id::{Id, marker::RoleMarker};

/// Parse a role from a raw argument (`<@&id>` or raw ID).
pub fn parse_role_id(raw: &str) -> Option<Id<RoleMarker>> {
    let trimmed = raw.trim();

    let numeric = if trimmed.starts_with("<@&") && trimmed.ends_with('>') {
        trimmed.strip_prefix("<@&")?.strip_suffix('>')?
    } else {
        trimmed
    };

    let id = numeric.parse::<u64>().ok()?;
    Id::new_checked(id)
}

/// Parse a duration like `1w2d3h4m5s`, any subset of it such as `24h` or
/// `2d12h`, or plain seconds.
///
/// Units must appear in descending order, at most once each. Zero is rejected.
pub fn parse_duration_seconds(raw: &str) -> Option<u64> {
    const UNITS: [(char, u64); 5] = [
        ('w', 7 * 24 * 60 * 60),
        ('d', 24 * 60 * 60),
        ('h', 60 * 60),
        ('m', 60),
        ('s', 1),
    ];

    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|byte| byte.is_ascii_digit()) {
        return value.parse::<u64>().ok().filter(|secs| *secs > 0);
    }

    let mut total = 0_u64;
    let mut digits = String::new();
    let mut next_unit = 0_usize;

    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let offset = UNITS[next_unit..].iter().position(|(unit, _)| *unit == ch)?;
        let (_, multiplier) = UNITS[next_unit + offset];
        if digits.is_empty() {
            return None;
        }

        let amount = digits.parse::<u64>().ok()?;
        total = total.checked_add(amount.checked_mul(multiplier)?)?;
        digits.clear();
        next_unit += offset + 1;
    }

    if !digits.is_empty() || total == 0 {
        return None;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration_seconds("24h"), Some(86_400));
        assert_eq!(parse_duration_seconds("1w2d3h4m5s"), Some(788_645));
        assert_eq!(parse_duration_seconds("2D12H"), Some(216_000));
        assert_eq!(parse_duration_seconds("90"), Some(90));
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_duration_seconds(""), None);
        assert_eq!(parse_duration_seconds("0"), None);
        assert_eq!(parse_duration_seconds("0h"), None);
        assert_eq!(parse_duration_seconds("h"), None);
        assert_eq!(parse_duration_seconds("3h2d"), None);
        assert_eq!(parse_duration_seconds("1h1h"), None);
        assert_eq!(parse_duration_seconds("5h30"), None);
        assert_eq!(parse_duration_seconds("10y"), None);
    }

    #[test]
    fn parses_role_mentions_and_raw_ids() {
        assert_eq!(parse_role_id("<@&123>"), Some(Id::new(123)));
        assert_eq!(parse_role_id(" 456 "), Some(Id::new(456)));
        assert_eq!(parse_role_id("<@123>"), None);
        assert_eq!(parse_role_id("0"), None);
        assert_eq!(parse_role_id("moderators"), None);
    }
}
