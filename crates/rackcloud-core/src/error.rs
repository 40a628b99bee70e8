//! Error types for Rackspace Cloud operations.
//!
//! Failures fall into two families: validation failures detected locally before
//! anything is sent, and remote failures (an unexpected status code or a
//! transport error). The remaining variants cover configuration and decoding.

use thiserror::Error;

/// Main error type for Rackspace Cloud operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller-supplied value is outside the provider's allowed set.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A resource with the same name (ignoring case) already exists.
    #[error("{kind} with name `{name}` already exists")]
    DuplicateName {
        /// Kind of resource being created
        kind: String,
        /// The conflicting, sanitized name
        name: String,
    },

    /// The provider answered with a status code outside the operation's success set.
    #[error("Operation failed with status {status}: {message}")]
    OperationFailed {
        /// HTTP status code returned by the provider
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// The provider could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Operation timed out
    #[error("Timeout waiting for service: {0}")]
    Timeout(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// The authentication handshake was rejected or incomplete
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Invalid resource identifier
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Failed to encode a request or decode a response
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Specialized result type for Rackspace Cloud operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::DuplicateName { .. } => "DUPLICATE_NAME",
            Self::OperationFailed { .. } => "OPERATION_FAILED",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidId(_) => "INVALID_ID",
            Self::ParseError(_) => "PARSE_ERROR",
        }
    }

    /// Returns true if the failure was detected locally and nothing was sent.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError(_) | Self::DuplicateName { .. })
    }

    /// Returns true if the failure came from the provider or the network.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::OperationFailed { .. }
                | Self::ServiceUnavailable(_)
                | Self::Timeout(_)
                | Self::HttpError(_)
        )
    }

    /// Returns the HTTP status carried by an [`Error::OperationFailed`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::OperationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}
