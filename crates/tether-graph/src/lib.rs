//! Typed client for a social-graph HTTP API.
//!
//! Objects and their connections are read, created and deleted through a
//! [`ResourceClient`] per resource kind. All requests are signed by a shared
//! [`tether_oauth::OAuthClient`]; without a valid token the calls return
//! [`AuthOutcome::NotAuthenticated`] instead of reaching the network.
//!
//! # Example
//!
//! ```no_run
//! use tether_graph::{AuthOutcome, Graph, TokenRecord};
//!
//! # async fn example() -> tether_graph::Result<()> {
//! let graph = Graph::builder().build()?;
//! graph.oauth().set_token(TokenRecord::new("stored-access-token"));
//!
//! match graph.user().get("me").await? {
//!     AuthOutcome::Authenticated(me) => println!("Hello, {}", me["name"]),
//!     AuthOutcome::NotAuthenticated => println!("Please log in"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod resource;
pub mod types;

pub use client::{Graph, GraphBuilder};
pub use config::{
    DEFAULT_API_URL, FACEBOOK_AUTH_URL, FACEBOOK_TOKEN_URL, GraphConfig, facebook_oauth_options,
    with_facebook_endpoints,
};
pub use error::{Error, Result};
pub use resource::ResourceClient;
pub use types::*;

// Re-export the OAuth types callers need alongside the graph client.
pub use tether_oauth::{AuthOutcome, OAuthClient, OAuthOptions, RequestBody, TokenRecord};
