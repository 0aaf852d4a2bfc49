//! Access token records.
//!
//! A [`TokenRecord`] is the persisted-state contract of the client: callers
//! that want sessions to survive a restart serialize it, store it wherever
//! they like, and hand it back through
//! [`OAuthClient::set_token`](crate::OAuthClient::set_token).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{OAuthError, Result};

/// Tokens expiring within this many seconds are treated as expired.
pub const EXPIRY_MARGIN_SECS: i64 = 20;

/// Current unix time in seconds.
pub(crate) fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// An access token as issued by the authorization server.
///
/// Deserialization normalizes the legacy `expires` field to `expires_in`,
/// so a record never carries `expires` once it has been read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, counted from `created`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Unix timestamp of the exchange that produced this token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Any other fields returned by the server (`token_type`, `scope`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenRecord {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            created: None,
            extra: Map::new(),
        }
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    pub fn with_created(mut self, timestamp: i64) -> Self {
        self.created = Some(timestamp);
        self
    }

    /// Build a record from its external JSON representation.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(OAuthError::Serialization(format!(
                "Token record must be an object, got {}",
                other
            ))),
        }
    }

    /// Build a record from a URL-encoded form body (`access_token=...&expires=...`).
    pub fn from_form(body: &str) -> Result<Self> {
        let map = url::form_urlencoded::parse(body.as_bytes())
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect::<Map<String, Value>>();
        Self::from_map(map)
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        let legacy = map.remove("expires");
        if !map.contains_key("expires_in") {
            if let Some(expires) = legacy {
                map.insert("expires_in".to_string(), expires);
            }
        }

        let access_token = match map.remove("access_token") {
            Some(Value::String(token)) => token,
            Some(other) => {
                return Err(OAuthError::Serialization(format!(
                    "access_token must be a string, got {}",
                    other
                )));
            }
            None => {
                return Err(OAuthError::Serialization(
                    "Token response has no access_token".to_string(),
                ));
            }
        };

        let refresh_token = match map.remove("refresh_token") {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => Some(token),
            Some(other) => {
                return Err(OAuthError::Serialization(format!(
                    "refresh_token must be a string, got {}",
                    other
                )));
            }
        };

        let expires_in = lenient_integer(map.remove("expires_in"), "expires_in")?
            .map(|v| u64::try_from(v).unwrap_or(0));
        let created = lenient_integer(map.remove("created"), "created")?;

        Ok(Self {
            access_token,
            refresh_token,
            expires_in,
            created,
            extra: map,
        })
    }

    /// Fold a legacy `expires` entry in `extra` into `expires_in`.
    ///
    /// An explicit `expires_in` wins; the `expires` key is always dropped.
    /// A value that is not an integer is discarded.
    pub fn normalize(&mut self) {
        let Some(legacy) = self.extra.remove("expires") else {
            return;
        };
        if self.expires_in.is_none() {
            self.expires_in = lenient_integer(Some(legacy), "expires")
                .ok()
                .flatten()
                .map(|v| u64::try_from(v).unwrap_or(0));
        }
    }

    /// Unix timestamp at which the token expires, if it has a lifetime.
    ///
    /// A record without `created` is dated at the epoch.
    pub fn expires_at(&self) -> Option<i64> {
        let expires_in = i64::try_from(self.expires_in?).unwrap_or(i64::MAX);
        Some(self.created.unwrap_or(0).saturating_add(expires_in))
    }

    /// Whether the token is usable at `now`, leaving [`EXPIRY_MARGIN_SECS`] of slack.
    pub fn is_valid_at(&self, now: i64) -> bool {
        if self.access_token.is_empty() {
            return false;
        }
        match self.expires_at() {
            Some(expires_at) => expires_at >= now.saturating_add(EXPIRY_MARGIN_SECS),
            None => true,
        }
    }

    /// Seconds until expiry at `now` (negative once expired).
    pub fn seconds_remaining(&self, now: i64) -> Option<i64> {
        self.expires_at().map(|at| at - now)
    }
}

impl<'de> Deserialize<'de> for TokenRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_map(map).map_err(serde::de::Error::custom)
    }
}

/// Accept integers encoded as JSON numbers or as numeric strings.
fn lenient_integer(value: Option<Value>, field: &str) -> Result<Option<i64>> {
    let invalid =
        |v: &Value| OAuthError::Serialization(format!("{} must be an integer, got {}", field, v));

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| invalid(&Value::Number(n.clone()))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(&Value::String(s.clone()))),
        Some(other) => Err(invalid(&other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_expires_is_renamed() {
        let token = TokenRecord::from_value(json!({
            "access_token": "A",
            "expires": 5183999,
        }))
        .unwrap();

        assert_eq!(token.expires_in, Some(5183999));
        assert!(!token.extra.contains_key("expires"));

        let serialized = serde_json::to_value(&token).unwrap();
        assert_eq!(serialized["expires_in"], 5183999);
        assert!(serialized.get("expires").is_none());
    }

    #[test]
    fn test_expires_in_wins_over_legacy() {
        let token = TokenRecord::from_value(json!({
            "access_token": "A",
            "expires_in": 60,
            "expires": 999,
        }))
        .unwrap();

        assert_eq!(token.expires_in, Some(60));
        assert!(!token.extra.contains_key("expires"));
    }

    #[test]
    fn test_normalize_folds_extra_expires() {
        let mut token = TokenRecord::new("A");
        token.extra.insert("expires".to_string(), json!("120"));
        token.normalize();
        assert_eq!(token.expires_in, Some(120));
        assert!(token.extra.is_empty());

        let mut token = TokenRecord::new("A").with_expires_in(5);
        token.extra.insert("expires".to_string(), json!(120));
        token.normalize();
        assert_eq!(token.expires_in, Some(5));
        assert!(token.extra.is_empty());

        let mut token = TokenRecord::new("A");
        token.extra.insert("expires".to_string(), json!("never"));
        token.normalize();
        assert_eq!(token.expires_in, None);
        assert!(token.extra.is_empty());
    }

    #[test]
    fn test_from_form_body() {
        let token = TokenRecord::from_form("access_token=abc%20def&expires=3600&machine_id=m1")
            .unwrap();

        assert_eq!(token.access_token, "abc def");
        assert_eq!(token.expires_in, Some(3600));
        assert_eq!(token.extra["machine_id"], "m1");
    }

    #[test]
    fn test_missing_access_token_is_rejected() {
        let err = TokenRecord::from_value(json!({"error": "invalid_grant"})).unwrap_err();
        assert!(matches!(err, OAuthError::Serialization(_)));

        assert!(TokenRecord::from_value(json!("A")).is_err());
        assert!(TokenRecord::from_value(json!({"access_token": "A", "expires_in": "soon"})).is_err());
    }

    #[test]
    fn test_deserialize_keeps_extra_fields() {
        let token: TokenRecord = serde_json::from_str(
            r#"{"access_token":"A","refresh_token":"R","token_type":"bearer","created":"1700000000"}"#,
        )
        .unwrap();

        assert_eq!(token.refresh_token.as_deref(), Some("R"));
        assert_eq!(token.created, Some(1_700_000_000));
        assert_eq!(token.extra["token_type"], "bearer");
    }

    #[test]
    fn test_validity_boundary() {
        let now = 1_700_000_000;
        let token = TokenRecord::new("A").with_created(now).with_expires_in(20);
        assert!(token.is_valid_at(now));

        let token = TokenRecord::new("A").with_created(now).with_expires_in(19);
        assert!(!token.is_valid_at(now));
    }

    #[test]
    fn test_validity_without_expiry() {
        assert!(TokenRecord::new("A").is_valid_at(i64::MAX - 1));
        assert!(!TokenRecord::new("").is_valid_at(0));
    }

    #[test]
    fn test_expires_in_without_created_is_expired() {
        let token = TokenRecord::new("A").with_expires_in(3600);
        assert_eq!(token.expires_at(), Some(3600));
        assert!(!token.is_valid_at(now_timestamp()));
    }

    #[test]
    fn test_seconds_remaining() {
        let token = TokenRecord::new("A").with_created(100).with_expires_in(60);
        assert_eq!(token.seconds_remaining(130), Some(30));
        assert_eq!(token.seconds_remaining(200), Some(-40));
        assert_eq!(TokenRecord::new("A").seconds_remaining(0), None);
    }
}
