//! Error types for Waypoint API operations.
//!
//! Errors are categorized so callers can tell a missing object (which a
//! resource read treats as "gone") from a transport or credential failure.

use std::fmt;

/// Result type alias for Waypoint API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// The requested object does not exist.
    NotFound,
    /// The token was rejected.
    Unauthorized,
    /// The server sent something the client could not decode.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Object not found",
            Self::Unauthorized => "Authentication failed",
            Self::Format => "Invalid server response",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check that the Waypoint server address is reachable and try again",
            Self::NotFound => "Verify the name or ID is correct",
            Self::Unauthorized => "Generate a new token with `waypoint user token` and retry",
            Self::Format => "Check that the client and server versions are compatible",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Waypoint.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The object does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The token was missing or rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Client settings are incomplete.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error for a described object, e.g. `project "web"`.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Map a transport error, naming the object for a 404.
    pub fn from_ureq(err: ureq::Error, what: &str) -> Self {
        match err {
            ureq::Error::StatusCode(404) => Self::NotFound(what.to_string()),
            ureq::Error::StatusCode(code @ (401 | 403)) => {
                Self::Unauthorized(format!("HTTP {code} while accessing {what}"))
            }
            other => other.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Http { status, .. } => match status {
                Some(404) => ErrorCategory::NotFound,
                Some(401 | 403) => ErrorCategory::Unauthorized,
                Some(code) if *code < 500 => ErrorCategory::Other,
                _ => ErrorCategory::Network,
            },
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::Unauthorized(_) => ErrorCategory::Unauthorized,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::InvalidConfig(_) => ErrorCategory::Other,
        }
    }

    /// Whether the requested object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
