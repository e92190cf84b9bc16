use chrono::{DateTime, NaiveDateTime, Utc};

pub const MAX_DAYS_SINCE_UPDATE: i64 = 120;

const UPDATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Parses `HH:MM:SS` into seconds. Hours may exceed two digits.
pub fn time_to_seconds(text: &str) -> Option<u64> {
    let mut parts = text.split(':');
    let hh: u64 = parts.next()?.parse().ok()?;
    let mm: u64 = parts.next()?.parse().ok()?;
    let ss: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hh * 3600 + mm * 60 + ss)
}

pub fn seconds_to_time(seconds: u64) -> String {
    let hh = seconds / 3600;
    let mm = (seconds % 3600) / 60;
    let ss = seconds % 60;
    format!("{hh:02}:{mm:02}:{ss:02}")
}

/// Whole days between `updated_at` and `now`, floored, capped at 120.
///
/// Returns `None` when the timestamp is not `YYYY-MM-DDTHH:MM:SS.fffZ`.
pub fn days_since_update(updated_at: &str, now: DateTime<Utc>) -> Option<i64> {
    let parsed = match NaiveDateTime::parse_from_str(updated_at, UPDATED_AT_FORMAT) {
        Ok(parsed) => parsed.and_utc(),
        Err(err) => {
            tracing::warn!(updated_at = %updated_at, error = %err, "Unparsable updated_at");
            return None;
        }
    };
    let days = (now - parsed).num_milliseconds().div_euclid(86_400_000);
    Some(days.min(MAX_DAYS_SINCE_UPDATE))
}
