//! Client error types.

use thiserror::Error;

use tether_oauth::OAuthError;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Token exchange, signing or transport failed.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No resource client exists for the requested kind.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status of the failed response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::OAuth(e) => e.status(),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::OAuth(e) if e.is_auth_error())
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
