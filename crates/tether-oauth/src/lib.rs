//! OAuth 2.0 client for the authorization-code and refresh-token flows.
//!
//! Builds the authorization URL a user visits, exchanges the returned code
//! for an access token, keeps that token fresh, and signs outgoing requests
//! with it.
//!
//! # Example
//!
//! ```no_run
//! use tether_oauth::{ApiRequest, AuthOutcome, OAuthClient, OAuthOptions, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = OAuthClient::with_reqwest(
//!     OAuthOptions::new()
//!         .with_auth_url("https://auth.example/authorize")
//!         .with_token_url("https://auth.example/token")
//!         .with_client_id("my-client")
//!         .with_client_secret("my-secret")
//!         .with_redirect_uri("https://app.example/callback")
//!         .with_refresh(true),
//! );
//!
//! println!("Visit {}", client.build_authorization_url()?);
//! client.authenticate("code-from-callback").await?;
//!
//! match client.request(ApiRequest::get("https://api.example/me")).await? {
//!     AuthOutcome::Authenticated(response) => println!("{}", response.body),
//!     AuthOutcome::NotAuthenticated => println!("login required"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`options`]: endpoints, credentials and signing behaviour
//! - [`token`]: the token record and its expiry rules
//! - [`oauth`]: token exchange, refresh and request signing
//! - [`transport`]: the HTTP seam, with reqwest and mock implementations

pub mod error;
pub mod oauth;
pub mod options;
pub mod token;
pub mod transport;

pub use error::{OAuthError, Result};
pub use oauth::{ApiRequest, AuthOutcome, OAuthClient};
pub use options::{AuthMethod, OAuthOptions, Scope};
pub use token::{EXPIRY_MARGIN_SECS, TokenRecord};
pub use transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockTransport, ReqwestTransport,
    RequestBody,
};
