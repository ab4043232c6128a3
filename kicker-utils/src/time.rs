use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in seconds, or zero if the clock is before the epoch.
pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
