use std::collections::HashMap;

use serde_json::Value;

use crate::config::Config;
use crate::error::{snippet, SyncError};
use crate::models::{Enriched, EnrollmentRecord, StudentKeyed};

const API_KEY_HEADER: &str = "api-key";

pub async fn fetch_enrollments(
    client: &reqwest::Client,
    config: &Config,
) -> Result<Vec<EnrollmentRecord>, SyncError> {
    let url = config.enrollment_url.as_str();
    let mut request = client.get(url);
    match &config.enrollment_api_key {
        Some(key) => request = request.header(API_KEY_HEADER, key),
        None => tracing::warn!(url = %url, "ENROLLMENT_API_KEY not set, requesting without it"),
    }

    let response = request
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

    tracing::info!(url = %url, status = status.as_u16(), "Enrollment API answered");
    tracing::debug!(body = %snippet(&body), "Enrollment API body");

    let entries: Vec<Value> = serde_json::from_str(&body).map_err(|e| SyncError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    })?;
    Ok(parse_enrollments(&entries))
}

/// Maps each enrollment object on its own. Objects without a string
/// `emailPd` are skipped; every other field is taken as sent.
pub fn parse_enrollments(entries: &[Value]) -> Vec<EnrollmentRecord> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Some(email) = entry.get("emailPd").and_then(Value::as_str) else {
                tracing::warn!(index, "Enrollment without emailPd skipped");
                return None;
            };
            Some(EnrollmentRecord {
                email: email.to_string(),
                registration_code: entry.get("registrationCode").cloned().unwrap_or(Value::Null),
                status: entry.get("status").cloned().unwrap_or(Value::Null),
            })
        })
        .collect()
}

/// Left join of `rows` with `enrollments` on email.
///
/// A row with several enrollments appears once per enrollment, in enrollment
/// order. Rows without a match keep empty enrollment fields.
pub fn join_enrollments<T>(rows: &[T], enrollments: &[EnrollmentRecord]) -> Vec<Enriched<T>>
where
    T: StudentKeyed + Clone,
{
    let mut by_email: HashMap<&str, Vec<&EnrollmentRecord>> = HashMap::new();
    for enrollment in enrollments {
        by_email
            .entry(enrollment.email.as_str())
            .or_default()
            .push(enrollment);
    }

    let mut joined = Vec::with_capacity(rows.len());
    for row in rows {
        match by_email.get(row.email()) {
            Some(matches) => {
                for enrollment in matches {
                    joined.push(Enriched {
                        record: row.clone(),
                        registration_code: enrollment.registration_code.clone(),
                        status: enrollment.status.clone(),
                    });
                }
            }
            None => joined.push(Enriched::bare(row.clone())),
        }
    }
    joined
}

/// Joins when enrollments are available, otherwise passes rows through.
pub fn enrich<T>(rows: &[T], enrollments: Option<&[EnrollmentRecord]>) -> Vec<Enriched<T>>
where
    T: StudentKeyed + Clone,
{
    match enrollments {
        Some(enrollments) => join_enrollments(rows, enrollments),
        None => rows.iter().cloned().map(Enriched::bare).collect(),
    }
}
