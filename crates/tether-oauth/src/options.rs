//! Client options: endpoints, credentials and signing behaviour.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OAuthError, Result};
use crate::token::TokenRecord;

/// Query parameter used for [`AuthMethod::Get`] when `get_param` is unset.
pub const DEFAULT_GET_PARAM: &str = "access_token";

/// How the access token is attached to outgoing requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// `Authorization: Bearer <token>` header.
    #[default]
    Bearer,
    /// `?<get_param>=<token>` query parameter.
    Get,
}

/// Requested permissions, either pre-joined or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scope {
    Single(String),
    List(Vec<String>),
}

impl Scope {
    /// Render the scope as sent on the wire (lists are space-joined).
    pub fn render(&self) -> String {
        match self {
            Scope::Single(s) => s.clone(),
            Scope::List(items) => items.join(" "),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Scope::Single(s) => s.is_empty(),
            Scope::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Scope::Single(s.to_string())
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Scope::Single(s)
    }
}

impl From<Vec<String>> for Scope {
    fn from(items: Vec<String>) -> Self {
        Scope::List(items)
    }
}

impl From<Vec<&str>> for Scope {
    fn from(items: Vec<&str>) -> Self {
        Scope::List(items.into_iter().map(str::to_string).collect())
    }
}

/// Options for an [`OAuthClient`](crate::OAuthClient).
///
/// Every field is optional; the operations that need a field check for it
/// and fail with [`OAuthError::Configuration`] when it is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub auth_method: AuthMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get_param: Option<String>,
    pub use_refresh: bool,
    /// Extra query parameters appended to the authorization URL.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub request_params: BTreeMap<String, String>,
    /// Initial token record, e.g. restored from a previous session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<TokenRecord>,
}

impl OAuthOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| OAuthError::Configuration(format!("Failed to parse options: {}", e)))
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OAuthError::Configuration(format!(
                "Failed to read options file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&contents)
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = Some(url.into());
        self
    }

    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_method = method;
        self
    }

    pub fn with_get_param(mut self, param: impl Into<String>) -> Self {
        self.get_param = Some(param.into());
        self
    }

    pub fn with_refresh(mut self, enabled: bool) -> Self {
        self.use_refresh = enabled;
        self
    }

    pub fn with_request_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_params.insert(key.into(), value.into());
        self
    }

    pub fn with_access_token(mut self, token: TokenRecord) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Query parameter name used for [`AuthMethod::Get`] signing.
    pub fn get_param(&self) -> &str {
        self.get_param
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_GET_PARAM)
    }

    /// Scope as sent on the wire, if one is configured.
    pub fn rendered_scope(&self) -> Option<String> {
        self.scope
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(Scope::render)
    }

    /// Return a required string option, treating empty strings as unset.
    pub(crate) fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OAuthError::Configuration(format!("{} is required", name)))
    }
}
