use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Errors surfaced by [`Requester`](crate::http_client::Requester).
///
/// Only `RobotsDisallowed` and `RequestFailed` come out of a request; the other
/// variants report invalid input or configuration before anything is sent.
#[derive(Debug, Error)]
pub enum Error {
    #[error("robots.txt disallows fetching {url}")]
    RobotsDisallowed { url: Url },
    #[error("Request to {url} failed after {attempts} attempts: {source}")]
    RequestFailed {
        url: Url,
        attempts: u32,
        source: AttemptError,
    },
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },
    #[error("Failed to serialize request body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
}

impl Error {
    pub fn is_robots_disallowed(&self) -> bool {
        matches!(self, Error::RobotsDisallowed { .. })
    }

    /// Number of attempts made before giving up, for `RequestFailed`.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::RequestFailed { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

/// Why a single attempt failed. Both kinds are retried the same way.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {status}")]
    HttpStatus { status: StatusCode },
}

impl AttemptError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AttemptError::Transport(e) => e.status(),
            AttemptError::HttpStatus { status } => Some(*status),
        }
    }
}
