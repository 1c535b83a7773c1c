//! Error types for the price engine
//!
//! One error enum covers the whole crate. Configuration errors are fatal at
//! setup; fetch errors are transient and stay inside the poller.

use std::fmt;
use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, EessError>;

/// What went wrong while fetching the upstream document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, TLS or timeout failure
    Network,
    /// Upstream answered with a non-2xx status
    HttpStatus,
    /// Body was not valid JSON
    Decode,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::HttpStatus => "http_status",
            Self::Decode => "decode",
        };
        f.write_str(label)
    }
}

/// Main error type
#[derive(Debug, Error)]
pub enum EessError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A single configuration field failed validation
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Upstream fetch failed
    #[error("Fetch error ({kind}): {message}")]
    Fetch {
        kind: FetchErrorKind,
        message: String,
    },

    /// A cycle was cancelled by teardown before it could publish
    #[error("Cycle cancelled")]
    Cancelled,

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// HTTP server errors
    #[error("Web server error: {message}")]
    Web { message: String },
}

impl EessError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a fetch error for a network failure
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            kind: FetchErrorKind::Network,
            message: message.into(),
        }
    }

    /// Create a fetch error for a non-2xx upstream status
    pub fn http_status(status: u16, url: &str) -> Self {
        Self::Fetch {
            kind: FetchErrorKind::HttpStatus,
            message: format!("{url} returned HTTP {status}"),
        }
    }

    /// Create a fetch error for an undecodable body
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            kind: FetchErrorKind::Decode,
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        Self::Web {
            message: message.into(),
        }
    }

    /// True for errors that must abort instance setup
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Validation { .. })
    }

    /// Kind of a fetch error, `None` for everything else
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Fetch { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EessError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for EessError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for EessError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Fetch {
                kind: FetchErrorKind::HttpStatus,
                message: format!("HTTP {status}: {err}"),
            }
        } else {
            Self::network(err.to_string())
        }
    }
}
