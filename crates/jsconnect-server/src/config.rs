//! Server Configuration

use jsconnect::JsConnectConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "JSCONNECT_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is not set
pub const DEFAULT_CONFIG_PATH: &str = "jsconnect.toml";

/// Server configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server settings
    pub server: HttpConfig,
    /// Host session settings
    pub session: SessionConfig,
    /// jsConnect handshake settings
    pub jsconnect: JsConnectConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Host session cookie settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session token
    pub cookie_name: String,
    /// HS256 key the session token is signed with
    pub jwt_secret: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            jwt_secret: String::new(),
        }
    }
}

impl ServerConfig {
    /// Loads `path` (optional) overlaid with `JSCONNECT__*` environment variables
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let exists = std::path::Path::new(path).exists();
        if !exists {
            tracing::warn!(path, "Config file not found, using defaults and environment");
        }

        config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("JSCONNECT").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Loads the file named by `JSCONNECT_CONFIG`
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsconnect::HashAlgorithm;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.session.cookie_name, "session");
        assert_eq!(config.jsconnect.timestamp_valid_for, 1800);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("jsconnect-test-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[session]
jwt_secret = "host-secret"

[jsconnect]
client_id = "forum"
client_secret = "s3cr3t"
hash_algorithm = "sha256"
api_base_uri = "https://forums.example.com/"

[jsconnect.username]
allow_duplicates = true
"#
        )
        .unwrap();

        let config = ServerConfig::load(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.session.jwt_secret, "host-secret");
        assert_eq!(config.session.cookie_name, "session");
        assert_eq!(config.jsconnect.client_id, "forum");
        assert_eq!(config.jsconnect.hash_algorithm, HashAlgorithm::Sha256);
        assert!(config.jsconnect.username.allow_duplicates);
        assert!(!config.jsconnect.username.allow_accents);
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load("/nonexistent/jsconnect.toml").unwrap();
        assert_eq!(config.jsconnect.timestamp_valid_for, 1800);
    }
}
