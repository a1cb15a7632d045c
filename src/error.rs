//! Errors returned by the activities backend client.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, reset)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response arrived but its body was not the expected JSON
    #[error("Failed to parse response (status {status}): {source}")]
    Parse {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    /// The backend answered non-2xx; `detail` is its explanation, if any
    #[error("Rejected by server (status {status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: StatusCode,
        detail: Option<String>,
    },
}

impl ApiError {
    /// Text shown to the user for a rejection, or `None` for transport/parse
    /// failures, which get a generic message instead.
    pub fn rejection_detail<'a>(&'a self, fallback: &'a str) -> Option<&'a str> {
        match self {
            ApiError::Rejected { detail, .. } => Some(detail.as_deref().unwrap_or(fallback)),
            _ => None,
        }
    }
}
