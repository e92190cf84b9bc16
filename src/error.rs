use thiserror::Error;

/// Failures of a single external call or payload.
///
/// None of these abort the process; the pipeline logs them and treats the
/// stage as having produced nothing.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    #[error("{url} answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("key '{0}' not found in response")]
    MissingKey(&'static str),

    #[error("field '{field}' missing from record {index}")]
    MissingField { field: &'static str, index: usize },

    #[error("field '{field}' of record {index} has an unexpected value")]
    InvalidField { field: &'static str, index: usize },

    #[error("could not decode response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

impl SyncError {
    pub fn transport(url: &str, err: reqwest::Error) -> Self {
        SyncError::Transport {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }
}

/// First 200 characters of a response body, for log lines.
pub fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
