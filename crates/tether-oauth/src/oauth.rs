//! OAuth 2.0 authorization-code and refresh-token flows, plus request signing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{OAuthError, Result};
use crate::options::{AuthMethod, OAuthOptions, Scope};
use crate::token::{TokenRecord, now_timestamp};
use crate::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, RequestBody,
};

/// Result of an operation that needs a valid access token.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome<T> {
    /// The operation ran with a valid token.
    Authenticated(T),
    /// No usable token was available; nothing was sent.
    NotAuthenticated,
}

impl<T> AuthOutcome<T> {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            AuthOutcome::Authenticated(value) => Some(value),
            AuthOutcome::NotAuthenticated => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AuthOutcome<U> {
        match self {
            AuthOutcome::Authenticated(value) => AuthOutcome::Authenticated(f(value)),
            AuthOutcome::NotAuthenticated => AuthOutcome::NotAuthenticated,
        }
    }

    /// Apply a fallible conversion to the authenticated value.
    pub fn try_map<U, E>(
        self,
        f: impl FnOnce(T) -> std::result::Result<U, E>,
    ) -> std::result::Result<AuthOutcome<U>, E> {
        match self {
            AuthOutcome::Authenticated(value) => f(value).map(AuthOutcome::Authenticated),
            AuthOutcome::NotAuthenticated => Ok(AuthOutcome::NotAuthenticated),
        }
    }
}

/// A request to sign and send with [`OAuthClient::request`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    url: String,
    method: String,
    data: Option<RequestBody>,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ApiRequest {
    /// A GET request for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "get".to_string(),
            data: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url).method("post")
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(url).method("delete")
    }

    /// Set the HTTP verb. Unsupported verbs are rejected when the request is sent.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Payload for `post`, `put` and `patch`; ignored for other verbs.
    pub fn data(mut self, data: RequestBody) -> Self {
        self.data = Some(data);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// OAuth 2.0 client.
///
/// Owns the options and the current token record. Resource clients share it
/// behind an `Arc` and only read token state through it.
///
/// Not designed for concurrent refreshes: two callers that both find the
/// token expired will both refresh it.
pub struct OAuthClient {
    options: RwLock<OAuthOptions>,
    token: RwLock<Option<TokenRecord>>,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClient")
            .field("token_url", &self.options.read().token_url)
            .field("has_token", &self.token.read().is_some())
            .field("transport", &self.transport)
            .finish()
    }
}

impl OAuthClient {
    /// Create a client sending requests through `transport`.
    ///
    /// A token record in `options.access_token` becomes the current token.
    pub fn new(mut options: OAuthOptions, transport: Arc<dyn HttpTransport>) -> Self {
        let token = options.access_token.take().map(|mut token| {
            token.normalize();
            token
        });
        Self {
            options: RwLock::new(options),
            token: RwLock::new(token),
            transport,
        }
    }

    /// Create a client using a default [`ReqwestTransport`].
    pub fn with_reqwest(options: OAuthOptions) -> Self {
        Self::new(options, Arc::new(ReqwestTransport::new()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Options and token state
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of the options, including the current token record.
    pub fn options(&self) -> OAuthOptions {
        let mut options = self.options.read().clone();
        options.access_token = self.token();
        options
    }

    /// Modify options in place. Setting `access_token` replaces the current token.
    pub fn update_options(&self, f: impl FnOnce(&mut OAuthOptions)) {
        let token = {
            let mut options = self.options.write();
            f(&mut options);
            options.access_token.take()
        };
        if let Some(token) = token {
            self.set_token(token);
        }
    }

    pub fn scope(&self) -> Option<Scope> {
        self.options.read().scope.clone()
    }

    pub fn set_scope(&self, scope: impl Into<Scope>) {
        self.options.write().scope = Some(scope.into());
    }

    /// The current token record, if any.
    pub fn token(&self) -> Option<TokenRecord> {
        self.token.read().clone()
    }

    /// Replace the current token record.
    ///
    /// A legacy `expires` entry left in `extra` is folded into `expires_in`.
    pub fn set_token(&self, mut token: TokenRecord) {
        token.normalize();
        *self.token.write() = Some(token);
    }

    /// Replace the current token from its external JSON representation.
    ///
    /// A legacy `expires` field is renamed to `expires_in`.
    pub fn set_token_value(&self, value: serde_json::Value) -> Result<()> {
        let token = TokenRecord::from_value(value)?;
        self.set_token(token);
        Ok(())
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Whether a token is stored and will not expire within the safety margin.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .as_ref()
            .is_some_and(|token| token.is_valid_at(now_timestamp()))
    }

    fn use_refresh(&self) -> bool {
        self.options.read().use_refresh
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Build the URL the resource owner visits to grant access.
    pub fn build_authorization_url(&self) -> Result<String> {
        let options = self.options.read();
        let (Some(auth_url), Some(client_id)) = (
            options.auth_url.as_deref().filter(|u| !u.is_empty()),
            options.client_id.as_deref().filter(|c| !c.is_empty()),
        ) else {
            return Err(OAuthError::Configuration(
                "Authorization URL and client_id are required".to_string(),
            ));
        };

        let mut params: Vec<(&str, String)> = vec![
            ("response_type", "code".to_string()),
            ("client_id", client_id.to_string()),
        ];
        if let Some(redirect_uri) = options.redirect_uri.as_deref().filter(|u| !u.is_empty()) {
            params.push(("redirect_uri", redirect_uri.to_string()));
        }
        if let Some(scope) = options.rendered_scope() {
            params.push(("scope", scope));
        }
        if let Some(state) = options.state.as_deref().filter(|s| !s.is_empty()) {
            params.push(("state", state.to_string()));
        }
        for (key, value) in &options.request_params {
            params.push((key.as_str(), value.clone()));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if auth_url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", auth_url, separator, query))
    }

    /// Exchange an authorization code for a token and store it.
    pub async fn authenticate(&self, code: &str) -> Result<TokenRecord> {
        let redirect_uri = self.options.read().redirect_uri.clone();

        let mut form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
        ];
        if let Some(redirect_uri) = redirect_uri.filter(|u| !u.is_empty()) {
            form.push(("redirect_uri".to_string(), redirect_uri));
        }

        let token = self.exchange("authorization_code", form).await?;
        self.set_token(token.clone());
        info!("Access token obtained");
        Ok(token)
    }

    /// Obtain a new access token with a refresh token.
    ///
    /// Uses the stored record's refresh token when `refresh_token` is `None`.
    /// The stored record is replaced; if the server does not send a new
    /// refresh token, the one used for this exchange is kept.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<TokenRecord> {
        if !self.use_refresh() {
            return Err(OAuthError::UnsupportedOperation(
                "Refresh token is not supported for this OAuth instance".to_string(),
            ));
        }

        let refresh_token = match refresh_token.filter(|t| !t.is_empty()) {
            Some(token) => token.to_string(),
            None => self
                .token
                .read()
                .as_ref()
                .and_then(|t| t.refresh_token.clone())
                .filter(|t| !t.is_empty())
                .ok_or(OAuthError::MissingRefreshToken)?,
        };

        let form = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.clone()),
        ];

        let mut token = self.exchange("refresh_token", form).await?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token);
        }
        self.set_token(token.clone());
        info!("Token refreshed successfully");
        Ok(token)
    }

    /// POST a grant to the token endpoint and decode the issued token.
    async fn exchange(
        &self,
        grant_type: &str,
        mut form: Vec<(String, String)>,
    ) -> Result<TokenRecord> {
        let (token_url, client_id, client_secret) = {
            let options = self.options.read();
            (
                OAuthOptions::require(&options.token_url, "token_url")?.to_string(),
                OAuthOptions::require(&options.client_id, "client_id")?.to_string(),
                OAuthOptions::require(&options.client_secret, "client_secret")?.to_string(),
            )
        };
        form.push(("client_id".to_string(), client_id));
        form.push(("client_secret".to_string(), client_secret));

        debug!(grant_type, url = %token_url, "Requesting access token");
        let response = self
            .transport
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: token_url,
                headers: vec![("Accept".to_string(), "application/json".to_string())],
                body: Some(RequestBody::Form(form)),
                timeout: None,
            })
            .await?;

        if !response.is_success() {
            warn!(grant_type, status = response.status, "Token exchange failed");
            return Err(OAuthError::TokenExchange {
                status: response.status,
                body: response.body,
            });
        }

        let created = now_timestamp();
        let mut token = if response.is_json() {
            TokenRecord::from_value(response.json()?)?
        } else {
            TokenRecord::from_form(&response.body)?
        };
        token.created = Some(created);
        Ok(token)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signed requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign and send a request with the current access token.
    ///
    /// An expired token is refreshed first when `use_refresh` is enabled;
    /// otherwise [`AuthOutcome::NotAuthenticated`] is returned without any
    /// network call. Responses with status 400 and above become
    /// [`OAuthError::Request`].
    pub async fn request(&self, request: ApiRequest) -> Result<AuthOutcome<HttpResponse>> {
        let method: HttpMethod = request.method.parse()?;

        let Some(mut token) = self.token() else {
            debug!(url = %request.url, "No access token; skipping request");
            return Ok(AuthOutcome::NotAuthenticated);
        };

        if !token.is_valid_at(now_timestamp()) {
            if !self.use_refresh() {
                debug!(url = %request.url, "Access token expired and refresh is disabled");
                return Ok(AuthOutcome::NotAuthenticated);
            }
            info!("Token expired, refreshing...");
            token = self.refresh(None).await?;
        }

        let (auth_method, get_param) = {
            let options = self.options.read();
            (options.auth_method, options.get_param().to_string())
        };

        let ApiRequest {
            mut url,
            data,
            mut headers,
            timeout,
            ..
        } = request;
        debug!(%method, url = %url, "Sending signed request");

        match auth_method {
            AuthMethod::Bearer => {
                headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
                headers.push((
                    "Authorization".to_string(),
                    format!("Bearer {}", token.access_token),
                ));
            }
            AuthMethod::Get => {
                let separator = if url.contains('?') { '&' } else { '?' };
                url = format!(
                    "{}{}{}={}",
                    url,
                    separator,
                    get_param,
                    urlencoding::encode(&token.access_token)
                );
            }
        }

        if !headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("accept"))
        {
            headers.push(("Accept".to_string(), "application/json".to_string()));
        }

        let response = self
            .transport
            .send(HttpRequest {
                method,
                url,
                headers,
                body: if method.has_body() { data } else { None },
                timeout,
            })
            .await?;

        if response.status >= 400 {
            warn!(%method, status = response.status, "Request failed");
            return Err(OAuthError::Request {
                status: response.status,
                body: response.body,
            });
        }

        Ok(AuthOutcome::Authenticated(response))
    }
}
