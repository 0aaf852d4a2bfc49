//! Graph facade: one lazily created resource client per kind.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tether_oauth::{OAuthClient, OAuthOptions};
use url::Url;

use crate::config::{DEFAULT_API_URL, GraphConfig, with_facebook_endpoints};
use crate::error::Result;
use crate::resource::ResourceClient;
use crate::types::ResourceKind;

/// Graph API client.
///
/// Resource clients share this client's [`OAuthClient`] and are created on
/// first access, then reused.
///
/// # Example
///
/// ```no_run
/// use tether_graph::{Graph, Pagination};
///
/// # async fn example() -> tether_graph::Result<()> {
/// let graph = Graph::builder()
///     .options(tether_graph::facebook_oauth_options().with_client_id("123"))
///     .build()?;
///
/// if let Some(friends) = graph
///     .user()
///     .get_connection("me", Some("friends"), "", &Pagination::new().limit(10))
///     .await?
///     .into_option()
/// {
///     println!("{:?}", friends);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Graph {
    inner: Arc<GraphInner>,
}

struct GraphInner {
    api_url: String,
    oauth: Arc<OAuthClient>,
    resources: Mutex<HashMap<ResourceKind, Arc<ResourceClient>>>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("api_url", &self.inner.api_url)
            .field("oauth", &self.inner.oauth)
            .finish()
    }
}

impl Graph {
    /// Create a new client builder.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Build a client from configuration, using the reqwest transport.
    pub fn from_config(config: GraphConfig) -> Result<Self> {
        Self::builder()
            .api_url(config.api_url)
            .options(config.oauth)
            .build()
    }

    /// Get the API base URL.
    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    /// The shared OAuth client.
    pub fn oauth(&self) -> &Arc<OAuthClient> {
        &self.inner.oauth
    }

    /// Resource client for `kind`, created on first use.
    pub fn resource(&self, kind: ResourceKind) -> Arc<ResourceClient> {
        let mut resources = self.inner.resources.lock();
        resources
            .entry(kind)
            .or_insert_with(|| {
                tracing::debug!(%kind, "Creating resource client");
                Arc::new(ResourceClient::new(
                    kind,
                    self.inner.api_url.clone(),
                    Arc::clone(&self.inner.oauth),
                ))
            })
            .clone()
    }

    /// Resource client by kind name (case-insensitive).
    pub fn resource_by_name(&self, name: &str) -> Result<Arc<ResourceClient>> {
        Ok(self.resource(name.parse()?))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resource accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn user(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::User)
    }

    pub fn status(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Status)
    }

    pub fn checkin(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Checkin)
    }

    pub fn event(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Event)
    }

    pub fn group(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Group)
    }

    pub fn link(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Link)
    }

    pub fn note(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Note)
    }

    pub fn post(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Post)
    }

    pub fn comment(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Comment)
    }

    pub fn photo(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Photo)
    }

    pub fn video(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Video)
    }

    pub fn album(&self) -> Arc<ResourceClient> {
        self.resource(ResourceKind::Album)
    }
}

/// Builder for creating a [`Graph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    api_url: Option<String>,
    oauth: Option<Arc<OAuthClient>>,
    options: Option<OAuthOptions>,
}

impl GraphBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Share an existing OAuth client.
    pub fn oauth(mut self, oauth: Arc<OAuthClient>) -> Self {
        self.oauth = Some(oauth);
        self
    }

    /// Options for a new OAuth client, used when no client is given.
    ///
    /// Missing endpoints default to Facebook's.
    pub fn options(mut self, options: OAuthOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Graph> {
        let api_url = self
            .api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        // Parse and normalize base URL
        let mut parsed = Url::parse(&api_url)?;
        if !parsed.path().ends_with('/') {
            parsed.set_path(&format!("{}/", parsed.path()));
        }

        let oauth = match self.oauth {
            Some(oauth) => oauth,
            None => Arc::new(OAuthClient::with_reqwest(with_facebook_endpoints(
                self.options.unwrap_or_default(),
            ))),
        };

        Ok(Graph {
            inner: Arc::new(GraphInner {
                api_url: parsed.into(),
                oauth,
                resources: Mutex::new(HashMap::new()),
            }),
        })
    }
}
