//! Configuration management
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. Binaries apply command-line flags last.

use crate::error::{ErrorContext, TerravaleError, TerravaleResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable names recognised by [`TerravaleConfig::apply_env_overrides`]
pub mod env_keys {
    pub const HOST: &str = "TERRAVALE_HOST";
    pub const PORT: &str = "TERRAVALE_PORT";
    pub const DEV_MODE: &str = "TERRAVALE_DEV_MODE";
    pub const ALLOWED_ORIGINS: &str = "TERRAVALE_ALLOWED_ORIGINS";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const JWT_SECRET: &str = "JWT_SECRET";
    pub const COOKIE_NAME: &str = "TERRAVALE_COOKIE_NAME";
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerravaleConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
    /// Frontend origins allowed to make credentialed cross-site requests
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

/// Credential store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Store connection URL, e.g. `sqlite://terravale.db`. In-memory store when unset.
    pub url: Option<String>,
}

/// Session token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie
    pub cookie_name: String,
    /// HMAC secret for signing session tokens
    pub jwt_secret: Option<String>,
    /// `iss` claim stamped into issued tokens
    pub issuer: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            jwt_secret: None,
            issuer: "terravale-api".to_string(),
        }
    }
}

impl TerravaleConfig {
    /// Load configuration: defaults, optional TOML file, then the process environment
    pub fn load(path: Option<&Path>) -> TerravaleResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> TerravaleResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TerravaleError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        toml::from_str(&content).map_err(|e| TerravaleError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> TerravaleResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| TerravaleError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| TerravaleError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`)
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> TerravaleResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env_keys::HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(env_keys::PORT) {
            self.server.port = port.parse().map_err(|_| {
                crate::validation_error!(
                    format!("Invalid port '{}'", port),
                    env_keys::PORT,
                    "config"
                )
            })?;
        }
        if let Some(dev_mode) = lookup(env_keys::DEV_MODE) {
            self.server.dev_mode = matches!(dev_mode.as_str(), "1" | "true" | "yes");
        }
        if let Some(origins) = lookup(env_keys::ALLOWED_ORIGINS) {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(url) = lookup(env_keys::DATABASE_URL) {
            self.database.url = Some(url).filter(|url| !url.is_empty());
        }
        if let Some(secret) = lookup(env_keys::JWT_SECRET) {
            self.session.jwt_secret = Some(secret).filter(|secret| !secret.is_empty());
        }
        if let Some(cookie_name) = lookup(env_keys::COOKIE_NAME) {
            self.session.cookie_name = cookie_name;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> TerravaleResult<()> {
        if self.server.port == 0 {
            return Err(crate::config_error!(
                "Server port must be greater than 0",
                "config"
            ));
        }

        if self.session.cookie_name.is_empty()
            || self
                .session
                .cookie_name
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, ';' | ',' | '='))
        {
            return Err(crate::config_error!(
                format!("Invalid cookie name '{}'", self.session.cookie_name),
                "config"
            ));
        }

        Ok(())
    }

    /// Socket address the server binds to
    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = TerravaleConfig::default();
        assert_eq!(config.address(), "127.0.0.1:8080");
        assert_eq!(config.session.cookie_name, "token");
        assert!(config.database.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TERRAVALE_PORT", "9090"),
            ("TERRAVALE_ALLOWED_ORIGINS", "https://terravale.app, https://admin.terravale.app"),
            ("DATABASE_URL", "sqlite://terravale.db"),
            ("JWT_SECRET", ""),
        ]
        .into_iter()
        .collect();

        let mut config = TerravaleConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://terravale.app", "https://admin.terravale.app"]
        );
        assert_eq!(config.database.url.as_deref(), Some("sqlite://terravale.db"));
        assert!(config.session.jwt_secret.is_none());
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = TerravaleConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "TERRAVALE_PORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(TerravaleError::Validation { .. })));
    }

    #[test]
    fn test_rejects_bad_cookie_name() {
        let mut config = TerravaleConfig::default();
        config.session.cookie_name = "my token".to_string();
        assert!(config.validate().is_err());
    }
}
