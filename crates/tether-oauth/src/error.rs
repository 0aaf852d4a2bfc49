//! Error types for the OAuth client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while exchanging tokens or signing requests.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// A required option is missing.
    #[error("Config error: {0}")]
    Configuration(String),

    /// The authorization server rejected a token exchange.
    #[error("Error code {status} received requesting access token: {body}")]
    TokenExchange {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The resource server returned an error response.
    #[error("Error code {status} received requesting data: {body}")]
    Request {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The operation is disabled by the current options.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A refresh was requested but no refresh token is available.
    #[error("No refresh token is available")]
    MissingRefreshToken,

    /// The requested HTTP verb is not one the client can send.
    #[error("Unknown HTTP request method: {0}")]
    InvalidMethod(String),

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl OAuthError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            OAuthError::TokenExchange { status, .. } | OAuthError::Request { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Check if the server rejected the credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
            || matches!(self, OAuthError::MissingRefreshToken)
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for OAuthError {
    fn from(e: serde_json::Error) -> Self {
        OAuthError::Serialization(e.to_string())
    }
}
