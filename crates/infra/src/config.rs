//! Application configuration.
//!
//! Values come from an optional TOML file (named by `RELIEFTRACK_CONFIG`),
//! then environment overrides. Every section has defaults, so an empty
//! file is a valid configuration.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use relieftrack_core::OrganizationId;
use relieftrack_observability::LogFormat;

pub const CONFIG_PATH_VAR: &str = "RELIEFTRACK_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Unset means the binary falls back to a dev secret.
    pub jwt_secret: Option<String>,
    pub token_ttl_minutes: u32,
    pub admin_email: String,
    /// Unset disables `/auth/login`.
    pub admin_password: Option<String>,
    /// Organization assigned to tokens issued by `/auth/login`.
    pub organization_id: OrganizationId,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_minutes: 60,
            admin_email: "admin@relieftrack.local".to_string(),
            admin_password: None,
            organization_id: OrganizationId::new(),
        }
    }
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "<redacted>"))
            .field("organization_id", &self.organization_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Re-read/re-validate attempts after a version conflict.
    pub max_conflict_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Buffered envelopes per SSE subscriber before it starts lagging.
    pub broadcast_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub service: ServiceConfig,
    pub realtime: RealtimeConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Some(read_file(Path::new(&path))?),
            Err(_) => None,
        };
        Self::from_sources(file.as_deref(), |name| std::env::var(name).ok())
    }

    /// Build from optional TOML text and an environment lookup.
    pub fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config: AppConfig = match file {
            Some(text) => toml::from_str(text)?,
            None => AppConfig::default(),
        };

        if let Some(bind) = env("RELIEFTRACK_BIND") {
            config.server.bind = bind;
        }
        if let Some(secret) = env("JWT_SECRET") {
            config.auth.jwt_secret = Some(secret);
        }
        if let Some(email) = env("RELIEFTRACK_ADMIN_EMAIL") {
            config.auth.admin_email = email;
        }
        if let Some(password) = env("RELIEFTRACK_ADMIN_PASSWORD") {
            config.auth.admin_password = Some(password);
        }
        if let Some(format) = env("RELIEFTRACK_LOG_FORMAT") {
            config.logging.format = format.parse().map_err(ConfigError::Invalid)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_minutes == 0 {
            return Err(ConfigError::Invalid(
                "auth.token_ttl_minutes must be greater than zero".to_string(),
            ));
        }
        if self.realtime.broadcast_capacity == 0 {
            return Err(ConfigError::Invalid(
                "realtime.broadcast_capacity must be greater than zero".to_string(),
            ));
        }
        if self.auth.jwt_secret.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid("auth.jwt_secret cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.auth.token_ttl_minutes))
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_sources() {
        let config = AppConfig::from_sources(None, no_env).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.auth.token_ttl_minutes, 60);
        assert_eq!(config.service.max_conflict_retries, 3);
        assert_eq!(config.realtime.broadcast_capacity, 1024);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn file_values_then_env_overrides() {
        let file = r#"
            [server]
            bind = "127.0.0.1:9000"

            [auth]
            jwt_secret = "from-file"
            token_ttl_minutes = 15
            organization_id = "0190f5a0-0000-7000-8000-000000000001"

            [service]
            max_conflict_retries = 5

            [logging]
            format = "pretty"
        "#;
        let env: HashMap<&str, &str> = [("JWT_SECRET", "from-env"), ("RELIEFTRACK_LOG_FORMAT", "json")]
            .into_iter()
            .collect();

        let config =
            AppConfig::from_sources(Some(file), |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-env"));
        assert_eq!(config.auth.token_ttl_minutes, 15);
        assert_eq!(
            config.auth.organization_id.to_string(),
            "0190f5a0-0000-7000-8000-000000000001"
        );
        assert_eq!(config.service.max_conflict_retries, 5);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.token_ttl(), chrono::Duration::minutes(15));
    }

    #[test]
    fn rejects_zero_ttl_and_capacity() {
        let err = AppConfig::from_sources(Some("[auth]\ntoken_ttl_minutes = 0"), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err =
            AppConfig::from_sources(Some("[realtime]\nbroadcast_capacity = 0"), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reports_parse_and_format_errors() {
        assert!(matches!(
            AppConfig::from_sources(Some("[server"), no_env),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AppConfig::from_sources(None, |k| (k == "RELIEFTRACK_LOG_FORMAT").then(|| "xml".into())),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("s3cret".into());
        config.auth.admin_password = Some("hunter2".into());
        let printed = format!("{config:?}");
        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("hunter2"));
    }
}
