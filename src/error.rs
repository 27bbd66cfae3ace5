//! Error types for JSON fetching.
//!
//! Every failure of a call maps to one [`FetchError`] variant; [`ErrorKind`]
//! gives the coarse classification used for logging and metrics labels.

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Coarse failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection, DNS or TLS failure before a response arrived.
    Transport,
    /// The server answered with a non-2xx status.
    Status,
    /// The call did not settle within its timeout.
    Timeout,
    /// The response body was not JSON.
    Parse,
    /// Token fetch or refresh failed.
    Token,
    /// The request could not be assembled (body or header encoding).
    Request,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Status => "status",
            Self::Timeout => "timeout",
            Self::Parse => "parse",
            Self::Token => "token",
            Self::Request => "request",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} {} ({status_text})", .status.as_u16())]
    Status {
        url: String,
        status: StatusCode,
        status_text: String,
    },

    #[error("fetch timeout after {}ms: {url}", .timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    #[error("could not get JSON from response of {url} ({status}): {source}")]
    Parse {
        url: String,
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("token request to {uri} failed: {reason}")]
    Token { uri: String, reason: String },

    #[error("request body is not serializable: {0}")]
    Body(#[source] serde_json::Error),

    #[error("invalid header value for '{name}'")]
    InvalidHeader { name: &'static str },
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Status { .. } => ErrorKind::Status,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Token { .. } => ErrorKind::Token,
            Self::Body(_) | Self::InvalidHeader { .. } => ErrorKind::Request,
        }
    }

    /// HTTP status of the response, when one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } | Self::Parse { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn token(uri: &str, reason: impl ToString) -> Self {
        Self::Token {
            uri: uri.to_owned(),
            reason: reason.to_string(),
        }
    }
}
