//! Error types for the REST client.
//!
//! # Design
//! Every non-2xx response lands in `Http` with the raw status and body; its
//! message is the body text alone so callers see what the server said. The
//! status stays on the value for callers that need to tell 404 apart from
//! other failures. Deserialization failures are kept separate from HTTP
//! failures.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `RestClient` and its transports.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The address is not an absolute URI.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The method text is not a valid HTTP method token.
    #[error("invalid HTTP method: {0:?}")]
    InvalidMethod(String),

    /// Sending the request or reading the response failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server returned a non-2xx status.
    #[error("{body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Polymorphic decoding was requested but the payload carries no type tag.
    #[error("payload is missing type tag field {tag:?}")]
    MissingTypeTag { tag: String },

    /// The transport could not be built from the supplied configuration.
    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the response, for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
