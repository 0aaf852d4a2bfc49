//! Generic resource client: object and connection reads and writes.

use std::sync::Arc;

use serde_json::Value;
use tether_oauth::{ApiRequest, AuthOutcome, HttpResponse, OAuthClient, RequestBody};
use url::{Url, form_urlencoded};

use crate::error::Result;
use crate::types::{Connection, Pagination, ResourceKind};

/// Client for one kind of graph object.
///
/// Every call first checks the shared [`OAuthClient`]; without a valid
/// token it returns [`AuthOutcome::NotAuthenticated`] and sends nothing.
#[derive(Debug)]
pub struct ResourceClient {
    kind: ResourceKind,
    api_url: String,
    oauth: Arc<OAuthClient>,
}

impl ResourceClient {
    pub fn new(kind: ResourceKind, api_url: impl Into<String>, oauth: Arc<OAuthClient>) -> Self {
        Self {
            kind,
            api_url: api_url.into(),
            oauth,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn oauth(&self) -> &Arc<OAuthClient> {
        &self.oauth
    }

    /// Build the URL for `path`, adding paging parameters that are set.
    ///
    /// The caller's query string is kept as written; a paging parameter
    /// replaces an existing one of the same name.
    pub fn fetch_url(&self, path: &str, page: &Pagination) -> Result<String> {
        let mut url = Url::parse(&format!("{}{}", self.api_url, path))?;
        let params = page.query_pairs();
        if params.is_empty() {
            return Ok(url.into());
        }

        let mut segments: Vec<String> = url
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter(|segment| {
                form_urlencoded::parse(segment.as_bytes())
                    .next()
                    .is_none_or(|(name, _)| !params.iter().any(|(p, _)| *p == name))
            })
            .map(str::to_string)
            .collect();
        segments.push(
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&params)
                .finish(),
        );
        url.set_query(Some(&segments.join("&")));
        Ok(url.into())
    }

    /// Fetch a single object.
    pub async fn get(&self, object_id: &str) -> Result<AuthOutcome<Value>> {
        if !self.oauth.is_authenticated() {
            return Ok(AuthOutcome::NotAuthenticated);
        }

        let url = self.fetch_url(object_id, &Pagination::default())?;
        self.send(ApiRequest::get(url))
            .await?
            .try_map(|response| decode(&response))
    }

    /// Fetch a connection of an object, e.g. `me/friends`.
    ///
    /// Without a connection name the object itself is fetched with
    /// `extra_fields` appended directly (`42?fields=id`), matching
    /// [`delete_connection`](Self::delete_connection); no trailing `/` is
    /// inserted. A response without a body yields its `Location` header
    /// instead.
    pub async fn get_connection(
        &self,
        object_id: &str,
        connection: Option<&str>,
        extra_fields: &str,
        page: &Pagination,
    ) -> Result<AuthOutcome<Connection>> {
        if !self.oauth.is_authenticated() {
            return Ok(AuthOutcome::NotAuthenticated);
        }

        let path = connection_path(object_id, connection, extra_fields);
        let url = self.fetch_url(&path, page)?;
        self.send(ApiRequest::get(url))
            .await?
            .try_map(|response| {
                if response.body.is_empty() {
                    let location = response.header("location").unwrap_or_default();
                    Ok(Connection::Location(location.to_string()))
                } else {
                    decode(&response).map(Connection::Json)
                }
            })
    }

    /// Create an object on a connection, e.g. post to `me/feed`.
    pub async fn create_connection(
        &self,
        object_id: &str,
        connection: Option<&str>,
        parameters: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<AuthOutcome<Value>> {
        if !self.oauth.is_authenticated() {
            return Ok(AuthOutcome::NotAuthenticated);
        }

        let path = connection_path(object_id, connection, "");
        let url = self.fetch_url(&path, &Pagination::default())?;
        let mut request = ApiRequest::post(url).headers(headers.iter().copied());
        if let Some(parameters) = parameters {
            request = request.data(parameters);
        }

        self.send(request)
            .await?
            .try_map(|response| decode(&response))
    }

    /// Delete an object or one of its connections.
    pub async fn delete_connection(
        &self,
        object_id: &str,
        connection: Option<&str>,
        extra_fields: &str,
    ) -> Result<AuthOutcome<Value>> {
        if !self.oauth.is_authenticated() {
            return Ok(AuthOutcome::NotAuthenticated);
        }

        let path = connection_path(object_id, connection, extra_fields);
        let url = self.fetch_url(&path, &Pagination::default())?;
        self.send(ApiRequest::delete(url))
            .await?
            .try_map(|response| decode(&response))
    }

    async fn send(&self, request: ApiRequest) -> Result<AuthOutcome<HttpResponse>> {
        tracing::debug!(kind = %self.kind, "Graph request");
        Ok(self.oauth.request(request).await?)
    }
}

fn connection_path(object_id: &str, connection: Option<&str>, extra_fields: &str) -> String {
    match connection.filter(|c| !c.is_empty()) {
        Some(connection) => format!("{}/{}{}", object_id, connection, extra_fields),
        None => format!("{}{}", object_id, extra_fields),
    }
}

/// Decode a JSON body; an empty body decodes to `null`.
fn decode(response: &HttpResponse) -> Result<Value> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&response.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_oauth::{HttpMethod, MockTransport, OAuthOptions, TokenRecord};

    const API_URL: &str = "https://graph.example/";

    fn client(token: Option<TokenRecord>) -> (ResourceClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let mut options = OAuthOptions::new();
        options.access_token = token;
        let oauth = Arc::new(OAuthClient::new(options, transport.clone()));
        (ResourceClient::new(ResourceKind::User, API_URL, oauth), transport)
    }

    fn authenticated() -> (ResourceClient, Arc<MockTransport>) {
        client(Some(TokenRecord::new("A")))
    }

    #[test]
    fn test_fetch_url_limit_only() {
        let (client, _) = authenticated();
        let url = client
            .fetch_url("123/photos", &Pagination::new().limit(10))
            .unwrap();
        assert_eq!(url, "https://graph.example/123/photos?limit=10");
    }

    #[test]
    fn test_fetch_url_without_params() {
        let (client, _) = authenticated();
        let url = client.fetch_url("me", &Pagination::default()).unwrap();
        assert_eq!(url, "https://graph.example/me");
    }

    #[test]
    fn test_fetch_url_all_params() {
        let (client, _) = authenticated();
        let page = Pagination::new()
            .limit(25)
            .offset(50)
            .until("1700000000")
            .since("1600000000");
        let url = client.fetch_url("me/feed", &page).unwrap();
        assert_eq!(
            url,
            "https://graph.example/me/feed?limit=25&offset=50&until=1700000000&since=1600000000"
        );
    }

    #[test]
    fn test_fetch_url_merges_existing_query() {
        let (client, _) = authenticated();
        let url = client
            .fetch_url("me/friends?fields=id&limit=1", &Pagination::new().limit(5))
            .unwrap();
        assert_eq!(url, "https://graph.example/me/friends?fields=id&limit=5");
    }

    #[test]
    fn test_connection_path() {
        assert_eq!(connection_path("me", Some("friends"), ""), "me/friends");
        assert_eq!(
            connection_path("me", Some("friends"), "?fields=id"),
            "me/friends?fields=id"
        );
        assert_eq!(connection_path("42", None, "/likes"), "42/likes");
        assert_eq!(connection_path("42", Some(""), ""), "42");
        assert_eq!(connection_path("me", None, ""), "me");
        assert_eq!(connection_path("42", None, "?fields=id"), "42?fields=id");
    }

    #[tokio::test]
    async fn test_get_connection_without_name_targets_object() {
        let (client, transport) = authenticated();
        transport.push_json(json!({"id": "42"}));

        client
            .get_connection("42", None, "?fields=id", &Pagination::default())
            .await
            .unwrap();
        assert_eq!(
            transport.requests()[0].url,
            "https://graph.example/42?fields=id"
        );
    }

    #[test]
    fn test_fetch_url_keeps_caller_query_verbatim() {
        let (client, _) = authenticated();
        let url = client
            .fetch_url("me?fields=id,name", &Pagination::default())
            .unwrap();
        assert_eq!(url, "https://graph.example/me?fields=id,name");

        let url = client
            .fetch_url("me?fields=id,name", &Pagination::new().limit(5))
            .unwrap();
        assert_eq!(url, "https://graph.example/me?fields=id,name&limit=5");
    }

    #[test]
    fn test_fetch_url_rejects_invalid_url_without_params() {
        let transport = Arc::new(MockTransport::new());
        let oauth = Arc::new(OAuthClient::new(OAuthOptions::new(), transport));
        let client = ResourceClient::new(ResourceKind::User, "not a url/", oauth);

        for page in [Pagination::default(), Pagination::new().limit(1)] {
            let err = client.fetch_url("me", &page).unwrap_err();
            assert!(matches!(err, crate::Error::InvalidUrl(_)));
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_send_nothing() {
        let (client, transport) = client(None);

        assert_eq!(client.get("me").await.unwrap(), AuthOutcome::NotAuthenticated);
        assert_eq!(
            client
                .get_connection("me", Some("friends"), "", &Pagination::default())
                .await
                .unwrap(),
            AuthOutcome::NotAuthenticated
        );
        assert_eq!(
            client
                .create_connection("me", Some("feed"), None, &[])
                .await
                .unwrap(),
            AuthOutcome::NotAuthenticated
        );
        assert_eq!(
            client.delete_connection("42", None, "").await.unwrap(),
            AuthOutcome::NotAuthenticated
        );
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_get_decodes_json() {
        let (client, transport) = authenticated();
        transport.push_json(json!({"id": "4", "name": "Mark"}));

        let value = client.get("4").await.unwrap().into_option().unwrap();
        assert_eq!(value["name"], "Mark");

        let request = &transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://graph.example/4");
        assert_eq!(request.header("Authorization"), Some("Bearer A"));
    }

    #[tokio::test]
    async fn test_get_connection_empty_body_returns_location() {
        let (client, transport) = authenticated();
        transport.push_response(HttpResponse::new(200, "").with_header("Location", "https://x/y"));

        let outcome = client
            .get_connection("me", Some("picture"), "", &Pagination::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::Authenticated(Connection::Location("https://x/y".to_string()))
        );
    }

    #[tokio::test]
    async fn test_get_connection_json() {
        let (client, transport) = authenticated();
        transport.push_json(json!({"data": [{"id": "1"}]}));

        let outcome = client
            .get_connection("me", Some("friends"), "", &Pagination::new().limit(1))
            .await
            .unwrap();
        let connection = outcome.into_option().unwrap();
        assert_eq!(connection.as_json().unwrap()["data"][0]["id"], "1");
        assert_eq!(
            transport.requests()[0].url,
            "https://graph.example/me/friends?limit=1"
        );
    }

    #[tokio::test]
    async fn test_get_invalid_json_is_an_error() {
        let (client, transport) = authenticated();
        transport.push_response(HttpResponse::new(200, "not json"));

        let err = client.get("me").await.unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }

    #[tokio::test]
    async fn test_create_connection_posts_parameters() {
        let (client, transport) = authenticated();
        transport.push_json(json!({"id": "1_2"}));

        let body = RequestBody::form([("message", "hello")]);
        let value = client
            .create_connection("me", Some("feed"), Some(body.clone()), &[("X-Custom", "1")])
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(value["id"], "1_2");

        let request = &transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://graph.example/me/feed");
        assert_eq!(request.body, Some(body));
        assert_eq!(request.header("x-custom"), Some("1"));
    }

    #[tokio::test]
    async fn test_delete_connection() {
        let (client, transport) = authenticated();
        transport.push_response(HttpResponse::new(200, "true"));

        let value = client
            .delete_connection("1_2", Some("likes"), "")
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(value, json!(true));

        let request = &transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.url, "https://graph.example/1_2/likes");
    }

    #[tokio::test]
    async fn test_empty_body_decodes_to_null() {
        let (client, transport) = authenticated();
        transport.push_response(HttpResponse::new(200, ""));

        let value = client.delete_connection("1", None, "").await.unwrap();
        assert_eq!(value, AuthOutcome::Authenticated(Value::Null));
    }

    #[tokio::test]
    async fn test_request_errors_propagate() {
        let (client, transport) = authenticated();
        transport.push_response(HttpResponse::new(404, "gone"));

        let err = client.get("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
