//! Forum User Directory
//!
//! Read-only lookups against the forum's `users/get.json` API. Any
//! unsuccessful HTTP status is reported as "no such user": the forum API
//! does not tell a missing user apart from other failures, so neither can
//! this client. Only transport failures are errors.

use crate::DirectoryError;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const USERS_ENDPOINT: &str = "api/v1/users/get.json";

/// Directory result type
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// User record returned by the forum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(rename = "Profile")]
    pub profile: RemoteProfile,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProfile {
    #[serde(rename = "UserID", default)]
    pub user_id: Option<i64>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "PhotoUrl", default)]
    pub photo_url: Option<String>,
}

impl RemoteUser {
    pub fn new(user_id: i64, name: &str) -> Self {
        Self {
            profile: RemoteProfile {
                user_id: Some(user_id),
                name: name.to_string(),
                email: None,
                photo_url: None,
            },
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.profile.email = Some(email.to_string());
        self
    }
}

/// Key a forum user is looked up by
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserSelector {
    Id(String),
    Email(String),
    Name(String),
}

impl UserSelector {
    /// Builds a selector from optional parts; exactly one must be set
    pub fn from_parts(
        id: Option<&str>,
        email: Option<&str>,
        name: Option<&str>,
    ) -> DirectoryResult<Self> {
        let mut set = [
            id.map(|v| Self::Id(v.to_string())),
            email.map(|v| Self::Email(v.to_string())),
            name.map(|v| Self::Name(v.to_string())),
        ]
        .into_iter()
        .flatten();

        match (set.next(), set.next()) {
            (Some(selector), None) => Ok(selector),
            (None, _) => Err(DirectoryError::InvalidArgument(
                "one of id, email or name must be supplied".to_string(),
            )),
            (Some(_), Some(_)) => Err(DirectoryError::InvalidArgument(
                "only one of id, email or name may be supplied".to_string(),
            )),
        }
    }

    /// Query parameter name used by the forum API
    pub fn parameter(&self) -> &'static str {
        match self {
            Self::Id(_) => "User.UserId",
            Self::Email(_) => "User.Email",
            Self::Name(_) => "User.Name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Id(v) | Self::Email(v) | Self::Name(v) => v,
        }
    }

    fn ensure_value(&self) -> DirectoryResult<()> {
        if self.value().is_empty() {
            return Err(DirectoryError::InvalidArgument(format!(
                "{} must not be empty",
                self.parameter()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for UserSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.parameter(), self.value())
    }
}

/// Read access to the forum's users
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user; `Ok(None)` when the forum has no match
    async fn find_user(&self, selector: &UserSelector) -> DirectoryResult<Option<RemoteUser>>;
}

/// Directory backed by the forum HTTP API
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDirectory {
    /// Create a client for `base_url`, e.g. `https://forums.example.com/`.
    ///
    /// An empty base URL is accepted here and reported on each lookup, so a
    /// misconfigured instance still answers the forum.
    pub fn new(base_url: &str, timeout: Duration) -> DirectoryResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn url(&self, selector: &UserSelector) -> String {
        format!(
            "{}{}?{}={}",
            self.base_url,
            USERS_ENDPOINT,
            selector.parameter(),
            urlencoding::encode(selector.value())
        )
    }
}

#[async_trait]
impl UserDirectory for HttpDirectory {
    async fn find_user(&self, selector: &UserSelector) -> DirectoryResult<Option<RemoteUser>> {
        if self.base_url.is_empty() {
            return Err(DirectoryError::NotConfigured);
        }
        selector.ensure_value()?;

        let url = self.url(selector);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(lookup = %selector, error = %e, "Forum directory request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(lookup = %selector, %status, "Forum user not found");
            return Ok(None);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(lookup = %selector, error = %e, "Forum directory response could not be read");
                return Err(e.into());
            }
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| DirectoryError::InvalidResponse(e.to_string()))
    }
}

/// In-memory directory (for testing and development)
pub struct InMemoryDirectory {
    users: RwLock<Vec<RemoteUser>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
        }
    }

    pub fn with_users(users: Vec<RemoteUser>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    pub fn insert(&self, user: RemoteUser) {
        self.users.write().push(user);
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, selector: &UserSelector) -> DirectoryResult<Option<RemoteUser>> {
        selector.ensure_value()?;

        let users = self.users.read();
        let found = users.iter().find(|user| {
            let profile = &user.profile;
            match selector {
                UserSelector::Id(id) => profile.user_id.map(|v| v.to_string()).as_deref() == Some(id.as_str()),
                UserSelector::Email(email) => profile.email.as_deref() == Some(email.as_str()),
                UserSelector::Name(name) => profile.name == *name,
            }
        });
        Ok(found.cloned())
    }
}
