//! HTTP transport seam.
//!
//! [`OAuthClient`](crate::OAuthClient) never talks to reqwest directly; it
//! hands an [`HttpRequest`] to an [`HttpTransport`]. Production code uses
//! [`ReqwestTransport`], tests can plug in [`MockTransport`].

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::error::{OAuthError, Result};

/// HTTP verbs the client is able to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Head,
    Get,
    Delete,
    Trace,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Get => "GET",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Whether requests with this verb carry a payload.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl FromStr for HttpMethod {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "head" => Ok(HttpMethod::Head),
            "get" => Ok(HttpMethod::Get),
            "delete" => Ok(HttpMethod::Delete),
            "trace" => Ok(HttpMethod::Trace),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "patch" => Ok(HttpMethod::Patch),
            _ => Err(OAuthError::InvalidMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// Sent verbatim.
    Raw(String),
}

impl RequestBody {
    pub fn form<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A fully signed request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response as seen by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the body is declared as JSON.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"))
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(OAuthError::from)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends requests on behalf of the OAuth client.
#[async_trait]
pub trait HttpTransport: Send + Sync + fmt::Debug {
    /// Send a request and return the response, whatever its status.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// Transport backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, TLS, redirect policy, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| OAuthError::InvalidMethod(e.to_string()))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder = match request.body {
            Some(RequestBody::Form(pairs)) => builder.form(&pairs),
            Some(RequestBody::Raw(raw)) => builder.body(raw),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            OAuthError::Network(format!("{} {} failed: {}", request.method, request.url, e))
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ============================================================================
// MockTransport (for testing)
// ============================================================================

/// Scripted transport for testing.
///
/// Replays queued responses in order and records every request it receives.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request.
    pub fn push_response(&self, response: HttpResponse) {
        self.responses.lock().push_back(response);
    }

    /// Queue a JSON response with status 200.
    pub fn push_json(&self, body: serde_json::Value) {
        self.push_response(
            HttpResponse::new(200, body.to_string())
                .with_header("Content-Type", "application/json"),
        );
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "MockTransport: request");
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| OAuthError::Network("MockTransport: no response queued".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_method_parsing() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("PATCH".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert!(HttpMethod::Post.has_body());
        assert!(!HttpMethod::Trace.has_body());

        let err = "connect".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, OAuthError::InvalidMethod(m) if m == "connect"));
    }

    #[test]
    fn test_response_helpers() {
        let response = HttpResponse::new(201, r#"{"id":"1"}"#)
            .with_header("Content-Type", "application/json; charset=UTF-8");
        assert!(response.is_success());
        assert!(response.is_json());
        assert_eq!(
            response.header("content-type"),
            Some("application/json; charset=UTF-8")
        );

        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["id"], "1");

        let response = HttpResponse::new(302, "").with_header("Location", "https://x/y");
        assert!(!response.is_success());
        assert!(!response.is_json());
        assert_eq!(response.header("location"), Some("https://x/y"));
    }

    #[tokio::test]
    async fn test_mock_transport_replays_in_order() {
        let transport = MockTransport::new();
        transport.push_response(HttpResponse::new(200, "first"));
        transport.push_response(HttpResponse::new(404, "second"));

        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "https://example.test/a".to_string(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
            timeout: None,
        };

        assert_eq!(transport.send(request.clone()).await.unwrap().body, "first");
        assert_eq!(transport.send(request.clone()).await.unwrap().status, 404);
        assert!(transport.send(request).await.is_err());
        assert_eq!(transport.request_count(), 3);
        assert_eq!(transport.requests()[0].header("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("Accept", "application/json"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Trace", "abc")
                    .set_body_string("ok"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new();
        let response = transport
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: format!("{}/token", server.uri()),
                headers: vec![("Accept".to_string(), "application/json".to_string())],
                body: Some(RequestBody::form([("grant_type", "authorization_code")])),
                timeout: Some(Duration::from_secs(5)),
            })
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
        assert_eq!(response.header("x-trace"), Some("abc"));
    }

    #[tokio::test]
    async fn test_reqwest_transport_returns_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
            .mount(&server)
            .await;

        let response = ReqwestTransport::new()
            .send(HttpRequest {
                method: HttpMethod::Delete,
                url: format!("{}/thing", server.uri()),
                headers: Vec::new(),
                body: None,
                timeout: None,
            })
            .await
            .unwrap();

        assert_eq!(response.status, 400);
        assert_eq!(response.body, "bad");
    }
}
