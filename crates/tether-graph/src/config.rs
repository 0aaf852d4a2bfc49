//! Graph client configuration and service endpoint defaults.
//!
//! ```toml
//! api_url = "https://graph.facebook.com/"
//!
//! [oauth]
//! client_id = "123"
//! client_secret = "s3cret"
//! redirect_uri = "https://app.example/callback"
//! scope = ["email", "user_posts"]
//! use_refresh = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tether_oauth::OAuthOptions;

use crate::error::{Error, Result};

/// Default graph API base URL.
pub const DEFAULT_API_URL: &str = "https://graph.facebook.com/";

/// Facebook login dialog.
pub const FACEBOOK_AUTH_URL: &str = "http://www.facebook.com/dialog/oauth";

/// Facebook token endpoint.
pub const FACEBOOK_TOKEN_URL: &str = "https://graph.facebook.com/oauth/access_token";

/// Fill in the Facebook authorization and token endpoints where unset.
pub fn with_facebook_endpoints(mut options: OAuthOptions) -> OAuthOptions {
    if options.auth_url.as_deref().is_none_or(str::is_empty) {
        options.auth_url = Some(FACEBOOK_AUTH_URL.to_string());
    }
    if options.token_url.as_deref().is_none_or(str::is_empty) {
        options.token_url = Some(FACEBOOK_TOKEN_URL.to_string());
    }
    options
}

/// OAuth options preconfigured with the Facebook endpoints.
pub fn facebook_oauth_options() -> OAuthOptions {
    with_facebook_endpoints(OAuthOptions::default())
}

/// Configuration for a [`Graph`](crate::Graph) client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub oauth: OAuthOptions,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            oauth: OAuthOptions::default(),
        }
    }
}

impl GraphConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&contents)
    }
}
