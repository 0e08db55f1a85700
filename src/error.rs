// src/error.rs

//! Unified error handling for the bookfeed client.

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Access token expired and could not be refreshed
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Backend returned 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Backend rejected the request (4xx other than 429)
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Backend failed (5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before reaching the network
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Coarse classification used by controllers to pick a recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure; the request may not have reached the backend
    Network,
    /// 401 that survived the refresh attempt
    AuthExpired,
    /// 429, shown to the user as-is
    RateLimited,
    /// 4xx with a message, or local input validation
    Validation,
    /// 5xx
    Server,
    /// Local faults: config, storage, decoding
    Internal,
}

/// Error body shape shared by every backend route.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build an error from a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited(message),
            s if s.is_server_error() => Self::Server {
                status: s.as_u16(),
                message,
            },
            s => Self::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Backend answered 401. On an authorized request this starts the
    /// token refresh; on a public one (login) it is a plain rejection.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected { status: 401, .. })
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) => ErrorKind::Network,
            Self::SessionExpired(_) => ErrorKind::AuthExpired,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Rejected { .. } | Self::Validation(_) => ErrorKind::Validation,
            Self::Server { .. } => ErrorKind::Server,
            Self::Io(_)
            | Self::Json(_)
            | Self::Toml(_)
            | Self::TomlSerialize(_)
            | Self::Url(_)
            | Self::Config(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the error is transient and an automatic retry is allowed.
    pub fn should_retry(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Server)
    }

    /// Text suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited(message) => message.clone(),
            Self::Rejected { message, .. } | Self::Validation(message) => message.clone(),
            Self::SessionExpired(_) => "Your session has expired. Please log in again.".into(),
            Self::Http(_) => {
                "Could not reach the server. Check your connection and try again.".into()
            }
            Self::Server { .. } => "Something went wrong on our side. Please try again.".into(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::AuthExpired => "auth_expired",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Validation => "validation",
            ErrorKind::Server => "server",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
