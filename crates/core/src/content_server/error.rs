//! Error types for content server calls.

use thiserror::Error;

/// Errors that can occur while talking to the content server.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentServerError {
    /// HTTP 401: the ticket or the credentials were not accepted.
    #[error("Unauthorized: invalid authentication ticket or credentials")]
    Unauthorized,

    /// Any other non-success status.
    #[error("Content server returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never reached the server.
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timeout")]
    Timeout,

    /// The server answered with a body we could not use.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No ticket has been obtained for this session yet.
    #[error("Session is not authenticated")]
    NotAuthenticated,

    /// The HTTP client could not be built or the request could not be prepared.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl ContentServerError {
    /// Whether a retry may succeed where this attempt failed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the request is known not to have reached the server.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Rejected { .. } => "rejected",
            Self::Connection(_) => "connection",
            Self::Timeout => "timeout",
            Self::InvalidResponse(_) => "invalid_response",
            Self::NotAuthenticated => "not_authenticated",
            Self::Client(_) => "client",
        }
    }

    /// Classify a reqwest transport error.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else if e.is_builder() {
            Self::Client(e.to_string())
        } else {
            Self::InvalidResponse(e.to_string())
        }
    }
}
