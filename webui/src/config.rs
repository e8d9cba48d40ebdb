// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use argon2::password_hash::PasswordHash;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_WORKERS: usize = 64;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4040
}

fn default_workers() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Externally visible origin, e.g. `https://console.example.com`. Absolute
    /// redirects are built from it rather than from the request's `Host` header.
    #[serde(default)]
    pub public_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            public_url: String::new(),
        }
    }
}

fn default_app_name() -> String {
    "Role Console".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiBackend {
    Http,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_api_backend")]
    pub backend: ApiBackend,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend: default_api_backend(),
            url: String::new(),
            client_name: default_client_name(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_api_backend() -> ApiBackend {
    ApiBackend::Http
}

fn default_client_name() -> String {
    "webui".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,
    #[serde(default)]
    pub secure_cookie: bool,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_minutes: default_ttl_minutes(),
            secure_cookie: false,
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_cookie_name() -> String {
    "webui_session".to_string()
}

fn default_ttl_minutes() -> u64 {
    120
}

fn default_max_sessions() -> usize {
    10000
}

/// Thirty days.
pub const MAX_SESSION_TTL_MINUTES: u64 = 30 * 24 * 60;

/// A console user. `password_hash` is an argon2 PHC string.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub users: Vec<UserConfig>,
}

impl ValidatedConfig {
    pub fn find_user(&self, name: &str) -> Option<&UserConfig> {
        self.users.iter().find(|user| user.name == name)
    }

    /// Origin used for absolute redirects: `app.public_url` when set, otherwise
    /// the listener address (wildcard binds are reported as `localhost`).
    pub fn public_base_url(&self) -> String {
        let public_url = self.app.public_url.trim().trim_end_matches('/');
        if !public_url.is_empty() {
            return public_url.to_string();
        }
        let host = match self.server.host.trim() {
            "0.0.0.0" | "::" | "[::]" => "localhost",
            host => host,
        };
        if host.contains(':') && !host.starts_with('[') {
            format!("http://[{}]:{}", host, self.server.port)
        } else {
            format!("http://{}:{}", host, self.server.port)
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&config_content).map_err(|e| match e {
            ConfigError::LoadError(msg) => ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        Self::validate_server(&self.server)?;
        Self::validate_api(&self.api)?;
        Self::validate_logging(&self.logging)?;
        Self::validate_session(&self.session)?;
        Self::validate_users(&self.users)?;

        if self.app.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "app.name cannot be empty".to_string(),
            ));
        }
        Self::validate_public_url(&self.app.public_url)?;

        Ok(ValidatedConfig {
            server: self.server,
            app: self.app,
            api: self.api,
            logging: self.logging,
            session: self.session,
            users: self.users,
        })
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
        if server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }
        if server.workers == 0 || server.workers > MAX_WORKERS {
            return Err(ConfigError::ValidationError(format!(
                "server.workers must be between 1 and {}, got: {}",
                MAX_WORKERS, server.workers
            )));
        }
        Ok(())
    }

    fn validate_public_url(public_url: &str) -> Result<(), ConfigError> {
        let public_url = public_url.trim();
        if public_url.is_empty() {
            return Ok(());
        }
        let authority = public_url
            .strip_prefix("https://")
            .or_else(|| public_url.strip_prefix("http://"))
            .map(|rest| rest.trim_end_matches('/'));
        match authority {
            Some(authority) if !authority.is_empty() && !authority.contains(['/', '?', '#']) => {
                Ok(())
            }
            _ => Err(ConfigError::ValidationError(format!(
                "app.public_url must be an http:// or https:// origin without a path, got: {}",
                public_url
            ))),
        }
    }

    fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
        if api.backend == ApiBackend::Http {
            let url = api.url.trim();
            if url.is_empty() {
                return Err(ConfigError::ValidationError(
                    "api.url is required for the http backend".to_string(),
                ));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "api.url must start with http:// or https://, got: {}",
                    url
                )));
            }
        }
        if api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if api.client_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.client_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let level = logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}, got: {}",
                LOG_LEVELS.join(", "),
                logging.level
            )));
        }
        Ok(())
    }

    fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
        let cookie_name = session.cookie_name.trim();
        if cookie_name.is_empty()
            || !cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::ValidationError(format!(
                "session.cookie_name is not a valid cookie name: '{}'",
                session.cookie_name
            )));
        }
        if session.ttl_minutes == 0 || session.ttl_minutes > MAX_SESSION_TTL_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "session.ttl_minutes must be between 1 and {}, got {}",
                MAX_SESSION_TTL_MINUTES, session.ttl_minutes
            )));
        }
        if session.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_sessions must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_users(users: &[UserConfig]) -> Result<(), ConfigError> {
        if users.is_empty() {
            warn!("No users configured; nobody will be able to log in");
        }
        let mut seen = HashSet::new();
        for user in users {
            if user.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "users[].name cannot be empty".to_string(),
                ));
            }
            if !seen.insert(user.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate user '{}'",
                    user.name
                )));
            }
            PasswordHash::new(&user.password_hash).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Invalid password_hash for user '{}': {}",
                    user.name, e
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::hash_password;

    fn validate_yaml(yaml: &str) -> Result<ValidatedConfig, ConfigError> {
        Config::parse(yaml)?.validate()
    }

    #[test]
    fn defaults_apply_for_memory_backend() {
        let config = validate_yaml("api:\n  backend: memory\n").unwrap();
        assert_eq!(config.server.port, 4040);
        assert_eq!(config.server.workers, 2);
        assert_eq!(config.app.name, "Role Console");
        assert_eq!(config.session.cookie_name, "webui_session");
        assert_eq!(config.logging.level, "info");
        assert!(config.users.is_empty());
    }

    #[test]
    fn http_backend_requires_url() {
        let err = validate_yaml("api:\n  backend: http\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = validate_yaml("api:\n  url: ftp://example.com\n").unwrap_err();
        assert!(err.to_string().contains("http://"));

        let config = validate_yaml("api:\n  url: https://config.example.com\n").unwrap();
        assert_eq!(config.api.backend, ApiBackend::Http);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_levels() {
        assert!(matches!(
            Config::parse("bogus: 1\n"),
            Err(ConfigError::LoadError(_))
        ));
        let err = validate_yaml("api:\n  backend: memory\nlogging:\n  level: loud\n").unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn validates_users() {
        let hash = hash_password("secret").unwrap();
        let yaml = format!(
            "api:\n  backend: memory\nusers:\n  - name: admin\n    password_hash: \"{}\"\n    groups: [admin]\n",
            hash
        );
        let config = validate_yaml(&yaml).unwrap();
        let admin = config.find_user("admin").unwrap();
        assert_eq!(admin.groups, vec!["admin"]);
        assert!(config.find_user("nobody").is_none());

        let duplicate = format!(
            "api:\n  backend: memory\nusers:\n  - name: a\n    password_hash: \"{h}\"\n  - name: a\n    password_hash: \"{h}\"\n",
            h = hash
        );
        assert!(validate_yaml(&duplicate).is_err());

        let bad_hash =
            "api:\n  backend: memory\nusers:\n  - name: a\n    password_hash: plain\n";
        assert!(validate_yaml(bad_hash).is_err());
    }

    #[test]
    fn public_base_url_prefers_configured_origin() {
        let config = validate_yaml("api:\n  backend: memory\n").unwrap();
        assert_eq!(config.public_base_url(), "http://127.0.0.1:4040");

        let config = validate_yaml(
            "server:\n  host: 0.0.0.0\n  port: 8080\napi:\n  backend: memory\n",
        )
        .unwrap();
        assert_eq!(config.public_base_url(), "http://localhost:8080");

        let config = validate_yaml(
            "app:\n  public_url: https://console.example.com/\napi:\n  backend: memory\n",
        )
        .unwrap();
        assert_eq!(config.public_base_url(), "https://console.example.com");

        for bad in ["console.example.com", "https://", "https://example.com/roles"] {
            let yaml = format!("app:\n  public_url: \"{}\"\napi:\n  backend: memory\n", bad);
            let err = validate_yaml(&yaml).unwrap_err();
            assert!(err.to_string().contains("app.public_url"), "{}", bad);
        }
    }

    #[test]
    fn session_ttl_must_be_bounded() {
        let err = validate_yaml("api:\n  backend: memory\nsession:\n  ttl_minutes: 0\n")
            .unwrap_err();
        assert!(err.to_string().contains("session.ttl_minutes"));

        let huge = format!(
            "api:\n  backend: memory\nsession:\n  ttl_minutes: {}\n",
            u64::MAX
        );
        let err = validate_yaml(&huge).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let longest = format!(
            "api:\n  backend: memory\nsession:\n  ttl_minutes: {}\n",
            MAX_SESSION_TTL_MINUTES
        );
        let config = validate_yaml(&longest).unwrap();
        assert_eq!(config.session.ttl_minutes, MAX_SESSION_TTL_MINUTES);
    }

    #[test]
    fn load_reads_config_from_runtime_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_and_validate(dir.path()),
            Err(ConfigError::LoadError(_))
        ));

        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "server:\n  port: 9000\napi:\n  backend: memory\n",
        )
        .unwrap();
        let config = Config::load_and_validate(dir.path()).unwrap();
        assert_eq!(config.server.port, 9000);
    }
}
