use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;

use crate::error::{snippet, SyncError};
use crate::filter;
use crate::models::{Enriched, StudentKeyed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cleared,
    Rejected(u16),
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Sent(usize),
    Rejected(u16),
    Failed,
    /// Nothing left after the domain filter; no request was made.
    Empty,
    Skipped,
}

/// Drops rows outside the allowed domains and maps the rest to the
/// destination's column set.
pub fn project<T, R>(rows: &[Enriched<T>], domains: &[String]) -> Vec<R>
where
    T: StudentKeyed,
    R: for<'a> From<&'a Enriched<T>>,
{
    rows.iter()
        .filter(|row| filter::is_allowed_email(row.email(), domains))
        .map(R::from)
        .collect()
}

pub async fn clear_destination(client: &reqwest::Client, url: &str) -> DeleteOutcome {
    match send_delete(client, url).await {
        Ok(()) => {
            tracing::info!(url = %url, "Destination cleared");
            DeleteOutcome::Cleared
        }
        Err(SyncError::Status { status, .. }) => {
            tracing::error!(url = %url, status, "Destination refused delete");
            DeleteOutcome::Rejected(status)
        }
        Err(err) => {
            tracing::error!(url = %url, error = %err, "Could not reach destination for delete");
            DeleteOutcome::Failed
        }
    }
}

async fn send_delete(client: &reqwest::Client, url: &str) -> Result<(), SyncError> {
    let response = client
        .delete(url)
        .send()
        .await
        .map_err(|e| SyncError::transport(url, e))?;
    let status = response.status();
    if matches!(status, StatusCode::OK | StatusCode::NO_CONTENT) {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(url = %url, body = %snippet(&body), "Delete response body");
    Err(SyncError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body: snippet(&body),
    })
}

pub async fn upload<R: Serialize>(client: &reqwest::Client, url: &str, rows: &[R]) -> PublishOutcome {
    if rows.is_empty() {
        tracing::warn!(url = %url, "No rows left after email filtering, nothing sent");
        return PublishOutcome::Empty;
    }

    match send_rows(client, url, rows).await {
        Ok(()) => {
            tracing::info!(url = %url, rows = rows.len(), "Rows uploaded");
            PublishOutcome::Sent(rows.len())
        }
        Err(SyncError::Status { status, body, .. }) => {
            tracing::error!(url = %url, status, body = %body, "Destination refused upload");
            PublishOutcome::Rejected(status)
        }
        Err(err) => {
            tracing::error!(url = %url, error = %err, "Could not reach destination for upload");
            PublishOutcome::Failed
        }
    }
}

async fn send_rows<R: Serialize>(
    client: &reqwest::Client,
    url: &str,
    rows: &[R],
) -> Result<(), SyncError> {
    let body = serde_json::to_vec(rows).map_err(|e| SyncError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    })?;
    let response = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| SyncError::transport(url, e))?;
    let status = response.status();
    if matches!(status, StatusCode::OK | StatusCode::CREATED) {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body: snippet(&body),
    })
}
