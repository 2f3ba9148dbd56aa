//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, JWT secret,
//! token expiry, database location, and the known users.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// JWT secret for signing session tokens
    pub jwt_secret: String,

    /// Token expiry in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// SQLite database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Where unauthenticated requests are sent
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Users allowed to establish a session
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// A user known to the identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    /// Login name, also the ownership identity
    pub username: String,

    /// Name shown on pages (defaults to the username)
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_token_expiry() -> u64 {
    3600
}

fn default_database_path() -> String {
    "quill.db".to_string()
}

fn default_login_url() -> String {
    "/login".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField("jwt_secret".to_string()));
        }
        if !self.login_url.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "login_url must be an absolute path, got `{}`",
                self.login_url
            )));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            let name = user.username.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid("user with empty username".to_string()));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!("duplicate user `{}`", name)));
            }
        }

        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            jwt_secret: "test-secret-key-do-not-use-in-production".to_string(),
            token_expiry_secs: 3600,
            database_path: ":memory:".to_string(),
            login_url: default_login_url(),
            log_level: default_log_level(),
            users: vec![
                UserConfig {
                    username: "alice".to_string(),
                    display_name: Some("Alice".to_string()),
                },
                UserConfig {
                    username: "bob".to_string(),
                    display_name: None,
                },
            ],
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
