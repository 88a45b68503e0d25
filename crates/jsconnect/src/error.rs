//! Error types for the jsConnect handshake

use thiserror::Error;

/// Protocol error code for malformed, stale or badly signed requests
pub const ERROR_INVALID_REQUEST: &str = "invalid_request";

/// Protocol error code for an unknown client id
pub const ERROR_INVALID_CLIENT: &str = "invalid_client";

/// Failures of the forum user directory
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The lookup was not given exactly one usable selector
    #[error("invalid directory lookup: {0}")]
    InvalidArgument(String),

    /// No API base URI is configured
    #[error("the forum API base URI is not configured")]
    NotConfigured,

    /// The forum API could not be reached
    #[error("forum directory unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The forum API answered with a body that is not a user record
    #[error("invalid forum directory response: {0}")]
    InvalidResponse(String),
}

/// Handshake failure, converted into the error payload at the handler boundary
#[derive(Error, Debug)]
pub enum JsConnectError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidClient(String),

    #[error("{0}")]
    InvalidArgument(DirectoryError),

    #[error("{0}")]
    DirectoryUnavailable(DirectoryError),

    #[error("{0}")]
    Configuration(String),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JsConnectError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::InvalidClient(message.into())
    }

    /// Wire error code, if the protocol defines one for this failure
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRequest(_) => Some(ERROR_INVALID_REQUEST),
            Self::InvalidClient(_) => Some(ERROR_INVALID_CLIENT),
            Self::InvalidArgument(_)
            | Self::DirectoryUnavailable(_)
            | Self::Configuration(_)
            | Self::Serialization(_) => None,
        }
    }

    /// Stable identifier used when logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::InvalidClient(_) => "InvalidClient",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::DirectoryUnavailable(_) => "DirectoryUnavailable",
            Self::Configuration(_) => "ConfigurationError",
            Self::Serialization(_) => "SerializationError",
        }
    }
}

impl From<DirectoryError> for JsConnectError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotConfigured => Self::Configuration(err.to_string()),
            DirectoryError::InvalidArgument(_) => Self::InvalidArgument(err),
            other => Self::DirectoryUnavailable(other),
        }
    }
}

/// Result type for the handshake
pub type JsConnectResult<T> = Result<T, JsConnectError>;
