use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::duration;
use crate::error::{snippet, SyncError};
use crate::models::WatchRecord;

const WATCHTIMES_KEY: &str = "watchtimes";

pub async fn fetch_watch_records(
    client: &reqwest::Client,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<Vec<WatchRecord>, SyncError> {
    let url = config.report_url.as_str();
    tracing::debug!(url = %url, "Requesting watch times");

    let response = client
        .get(url)
        .query(&config.window.query())
        .send()
        .await
        .map_err(|e| SyncError::transport(url, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SyncError::transport(url, e))?;

    if !status.is_success() {
        return Err(SyncError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: snippet(&body),
        });
    }

    tracing::info!(url = %url, status = status.as_u16(), "Reporting API answered");
    tracing::debug!(body = %snippet(&body), "Reporting API body");

    let payload: Value = serde_json::from_str(&body).map_err(|e| SyncError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    parse_watchtimes(&payload, now)
}

/// Converts the reporting payload into records.
///
/// Every object under `watchtimes` must carry all five source fields.
pub fn parse_watchtimes(payload: &Value, now: DateTime<Utc>) -> Result<Vec<WatchRecord>, SyncError> {
    let entries = payload
        .get(WATCHTIMES_KEY)
        .and_then(Value::as_array)
        .ok_or(SyncError::MissingKey(WATCHTIMES_KEY))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let object = entry
                .as_object()
                .ok_or(SyncError::InvalidField { field: WATCHTIMES_KEY, index })?;
            parse_record(object, index, now)
        })
        .collect()
}

fn parse_record(
    object: &Map<String, Value>,
    index: usize,
    now: DateTime<Utc>,
) -> Result<WatchRecord, SyncError> {
    let email = text_field(object, "user_email", index)?;
    let full_name = text_field(object, "user_full_name", index)?;
    let course = text_field(object, "course_name", index)?;
    let watched_ms = millis_field(object, "until_completed_duration", index)?;
    let (last_updated, days_since_update) = match object.get("updated_at") {
        None => return Err(SyncError::MissingField { field: "updated_at", index }),
        Some(Value::String(text)) => (text.clone(), duration::days_since_update(text, now)),
        Some(other) => {
            tracing::warn!(index, updated_at = %other, "updated_at is not a timestamp string");
            let raw = match other {
                Value::Null => String::new(),
                value => value.to_string(),
            };
            (raw, None)
        }
    };

    Ok(WatchRecord {
        email,
        full_name,
        course,
        watched_ms,
        last_updated,
        days_since_update,
    })
}

fn present<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
    index: usize,
) -> Result<&'a Value, SyncError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(SyncError::MissingField { field, index }),
        Some(value) => Ok(value),
    }
}

fn text_field(
    object: &Map<String, Value>,
    field: &'static str,
    index: usize,
) -> Result<String, SyncError> {
    present(object, field, index)?
        .as_str()
        .map(str::to_string)
        .ok_or(SyncError::InvalidField { field, index })
}

fn millis_field(
    object: &Map<String, Value>,
    field: &'static str,
    index: usize,
) -> Result<u64, SyncError> {
    let value = present(object, field, index)?;
    if let Some(ms) = value.as_u64() {
        return Ok(ms);
    }
    match value.as_f64() {
        Some(ms) if ms >= 0.0 && ms.is_finite() => Ok(ms as u64),
        _ => Err(SyncError::InvalidField { field, index }),
    }
}
