//! Error types for paydrop.

use std::fmt;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in paydrop.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed client input.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown asset, order or file.
    #[error("not found: {0}")]
    NotFound(String),

    /// Signature mismatch, or an invalid, used or expired token.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Payment processor unreachable, timed out or rejected the call.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Externally visible failure classes.
///
/// Every [`Error`] collapses onto exactly one of these at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing client input (400).
    InvalidRequest,
    /// Unknown asset, order or file (404).
    NotFound,
    /// Authentication or capability failure (403).
    Forbidden,
    /// Payment processor failure (500).
    UpstreamError,
    /// Storage failure or unexpected error (500).
    InternalError,
}

impl ErrorKind {
    /// Stable machine-readable code sent to clients.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::UpstreamError => "upstream_error",
            Self::InternalError => "internal_error",
        }
    }

    /// Whether the error detail may be shown to the client.
    #[must_use]
    pub fn is_client_facing(self) -> bool {
        matches!(
            self,
            Self::InvalidRequest | Self::NotFound | Self::Forbidden
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Error {
    /// Classify this error into the externally visible taxonomy.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Upstream(_) => ErrorKind::UpstreamError,
            Self::Storage(_) | Self::Config(_) | Self::Serialization(_) | Self::Io(_) => {
                ErrorKind::InternalError
            }
        }
    }

    /// Message safe to return to a client.
    ///
    /// Upstream and internal failures are replaced with a generic text; the
    /// detail stays in the server log.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) | Self::NotFound(msg) | Self::Forbidden(msg) => msg.clone(),
            Self::Upstream(_) => "payment processor error".to_string(),
            _ => "server error".to_string(),
        }
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
