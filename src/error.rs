use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilingsError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{}", status_text(.status, .message))]
    Status { status: u16, message: Option<String> },

    #[error("{0}")]
    Application(String),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

fn status_text(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(msg) => format!("{msg} (HTTP {status})"),
        None => format!("Request failed: HTTP {status}"),
    }
}

impl FilingsError {
    /// Transport failures, 5xx and 429 are worth another attempt. Everything
    /// else (application errors, 4xx, undecodable bodies) will fail the same
    /// way again.
    ///
    /// Note the `retries` setting only spends attempts on these. A 404 or a
    /// malformed body is reported after the first request, where a blanket
    /// "retry everything" client would repeat it `retries` more times.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FilingsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request rejected, non-2xx status, or an unreadable body.
    Network,
    /// A response that decoded fine but carried an `error` field.
    Application,
}

/// Cloneable view of a failed fetch, held by views and passed across the
/// response channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<FilingsError> for FetchFailure {
    fn from(err: FilingsError) -> Self {
        let kind = match err {
            FilingsError::Application(_) => FailureKind::Application,
            _ => FailureKind::Network,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
