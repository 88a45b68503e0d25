//! Handshake configuration

use crate::signature::HashAlgorithm;
use crate::{JsConnectError, JsConnectResult};
use serde::{Deserialize, Serialize};

/// Default signature validity window (30 minutes)
pub const DEFAULT_TIMESTAMP_VALID_FOR: i64 = 30 * 60;

/// jsConnect configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JsConnectConfig {
    /// Public identifier of the forum instance
    pub client_id: String,
    /// Secret shared with the forum instance
    pub client_secret: String,
    /// Maximum clock skew accepted for signed requests, in seconds
    pub timestamp_valid_for: i64,
    /// Digest used for request and response signatures
    pub hash_algorithm: HashAlgorithm,
    /// Forum API base URI, e.g. `https://forums.example.com/`
    pub api_base_uri: String,
    /// Which identity attribute links an existing forum account
    pub link_by: LinkBy,
    /// Username policy for newly linked accounts
    pub username: UsernamePolicy,
    /// Timeout for a single directory lookup, in seconds
    pub request_timeout_secs: u64,
}

impl Default for JsConnectConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            timestamp_valid_for: DEFAULT_TIMESTAMP_VALID_FOR,
            hash_algorithm: HashAlgorithm::default(),
            api_base_uri: String::new(),
            link_by: LinkBy::default(),
            username: UsernamePolicy::default(),
            request_timeout_secs: 30,
        }
    }
}

impl JsConnectConfig {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            ..Default::default()
        }
    }

    pub fn with_api_base_uri(mut self, uri: &str) -> Self {
        self.api_base_uri = uri.to_string();
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn with_username_policy(mut self, policy: UsernamePolicy) -> Self {
        self.username = policy;
        self
    }

    pub fn with_link_by(mut self, link_by: LinkBy) -> Self {
        self.link_by = link_by;
        self
    }

    /// Checks the settings that must be present when a request is served
    pub fn ensure_usable(&self) -> JsConnectResult<()> {
        if self.client_secret.is_empty() {
            return Err(JsConnectError::Configuration(
                "The jsConnect client secret must not be empty.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identity attribute used to find an already linked forum account
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkBy {
    #[default]
    UniqueId,
    Email,
}

/// Username rules applied to new forum accounts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsernamePolicy {
    /// Keep whitespace in generated names
    pub allow_whitespace: bool,
    /// Keep diacritics in generated names
    pub allow_accents: bool,
    /// Skip the uniqueness probe against the forum
    pub allow_duplicates: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JsConnectConfig::default();
        assert_eq!(config.timestamp_valid_for, 1800);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Md5);
        assert_eq!(config.link_by, LinkBy::UniqueId);
        assert_eq!(config.username, UsernamePolicy::default());
    }

    #[test]
    fn test_partial_deserialize() {
        let config: JsConnectConfig = serde_json::from_str(
            r#"{"client_id":"forum","hash_algorithm":"sha512","username":{"allow_accents":true}}"#,
        )
        .unwrap();

        assert_eq!(config.client_id, "forum");
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha512);
        assert!(config.username.allow_accents);
        assert!(!config.username.allow_whitespace);
        assert_eq!(config.timestamp_valid_for, DEFAULT_TIMESTAMP_VALID_FOR);
    }

    #[test]
    fn test_empty_secret_is_unusable() {
        assert!(JsConnectConfig::new("forum", "").ensure_usable().is_err());
        assert!(JsConnectConfig::new("forum", "secret").ensure_usable().is_ok());
    }
}
