//! Request and response types shared by the resource clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Resource kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Category of remote object exposed through the graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    User,
    Status,
    Checkin,
    Event,
    Group,
    Link,
    Note,
    Post,
    Comment,
    Photo,
    Video,
    Album,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 12] = [
        ResourceKind::User,
        ResourceKind::Status,
        ResourceKind::Checkin,
        ResourceKind::Event,
        ResourceKind::Group,
        ResourceKind::Link,
        ResourceKind::Note,
        ResourceKind::Post,
        ResourceKind::Comment,
        ResourceKind::Photo,
        ResourceKind::Video,
        ResourceKind::Album,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Status => "status",
            ResourceKind::Checkin => "checkin",
            ResourceKind::Event => "event",
            ResourceKind::Group => "group",
            ResourceKind::Link => "link",
            ResourceKind::Note => "note",
            ResourceKind::Post => "post",
            ResourceKind::Comment => "comment",
            ResourceKind::Photo => "photo",
            ResourceKind::Video => "video",
            ResourceKind::Album => "album",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::UnknownResource(s.to_string()))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pagination
// ─────────────────────────────────────────────────────────────────────────────

/// Paging and time-window parameters for connection reads.
///
/// Zero `limit`/`offset` and `None` bounds are left out of the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Upper time bound (unix timestamp or any format the API accepts).
    pub fn until(mut self, until: impl Into<String>) -> Self {
        self.until = Some(until.into());
        self
    }

    /// Lower time bound (unix timestamp or any format the API accepts).
    pub fn since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    /// Query parameters in URL order.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        if self.offset > 0 {
            pairs.push(("offset", self.offset.to_string()));
        }
        if let Some(until) = &self.until {
            pairs.push(("until", until.clone()));
        }
        if let Some(since) = &self.since {
            pairs.push(("since", since.clone()));
        }
        pairs
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection reads
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a connection read.
#[derive(Debug, Clone, PartialEq)]
pub enum Connection {
    /// Decoded JSON payload.
    Json(serde_json::Value),
    /// The response had no body; this is its `Location` header.
    Location(String),
}

impl Connection {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Connection::Json(value) => Some(value),
            Connection::Location(_) => None,
        }
    }

    pub fn as_location(&self) -> Option<&str> {
        match self {
            Connection::Location(location) => Some(location),
            Connection::Json(_) => None,
        }
    }
}
