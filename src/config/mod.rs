//! # Configuration Settings
//!
//! Defines the configuration structure for the authcore service. All secrets
//! and TTLs live here and are passed by reference into the components that
//! need them at construction time; there is no process-wide settings global.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Token signing and credential policy configuration
    #[validate(nested)]
    pub auth: AuthConfig,

    /// Outbound mail configuration
    #[validate(nested)]
    pub mail: MailConfig,
}

impl AppConfig {
    /// Load configuration from environment variables, applying defaults for
    /// anything unset. `SECRET_KEY` and `DATABASE_URL` have no safe default
    /// and must be present.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            server: ServerConfig {
                host: env_or("HOST", "127.0.0.1"),
                port: env_parse("PORT", 8080)?,
            },
            database: DatabaseConfig {
                url: require_env("DATABASE_URL")?,
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: env_parse("DATABASE_MIN_CONNECTIONS", 0)?,
                connect_timeout_seconds: env_parse("DATABASE_CONNECT_TIMEOUT_SECONDS", 10)?,
                auto_migrate: env_parse("DATABASE_AUTO_MIGRATE", true)?,
            },
            auth: AuthConfig {
                jwt_secret: require_env("SECRET_KEY")?,
                access_token_expire_minutes: env_parse("ACCESS_TOKEN_EXPIRE_MINUTES", 15)?,
                refresh_token_expire_days: env_parse("REFRESH_TOKEN_EXPIRE_DAYS", 7)?,
                reset_token_expire_minutes: env_parse("RESET_TOKEN_EXPIRE_MINUTES", 60)?,
            },
            mail: MailConfig {
                frontend_url: env_or("FRONTEND_URL", "http://localhost:5173"),
                smtp_host: env_or("MAIL_SERVER", "smtp.example.com"),
                smtp_port: env_parse("MAIL_PORT", 587)?,
                smtp_username: env_or("MAIL_USERNAME", ""),
                smtp_password: env_or("MAIL_PASSWORD", ""),
                from_address: env_or("MAIL_FROM", "noreply@example.com"),
                from_name: env_or("MAIL_FROM_NAME", "authcore"),
                smtp_enabled: env_parse("MAIL_SMTP_ENABLED", false)?,
            },
        };

        config.validate_all()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite:") {
            return Err(Error::validation("Database URL must start with 'sqlite:'"));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(Error::validation("JWT secret must be at least 32 characters long"));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(min = 1, max = 60, message = "Connect timeout must be between 1 and 60 seconds"))]
    pub connect_timeout_seconds: u64,

    /// Enable automatic migrations on startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/authcore.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Token signing and credential lifecycle configuration.
///
/// Passed by reference into the token codec and the auth orchestrator when
/// they are constructed.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AuthConfig {
    /// Symmetric secret used to sign and verify JWTs (HS256)
    #[validate(length(min = 32, message = "JWT secret must be at least 32 characters"))]
    pub jwt_secret: String,

    /// Access token lifetime in minutes
    #[validate(range(min = 1, message = "Access token TTL must be at least 1 minute"))]
    pub access_token_expire_minutes: i64,

    /// Refresh token lifetime in days
    #[validate(range(min = 1, message = "Refresh token TTL must be at least 1 day"))]
    pub refresh_token_expire_days: i64,

    /// Password reset token lifetime in minutes
    #[validate(range(min = 1, message = "Reset token TTL must be at least 1 minute"))]
    pub reset_token_expire_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_expire_minutes: 15,
            refresh_token_expire_days: 7,
            reset_token_expire_minutes: 60,
        }
    }
}

/// Outbound mail configuration for password-reset links
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MailConfig {
    /// Base URL the reset link points at
    #[validate(length(min = 1, message = "Frontend URL cannot be empty"))]
    pub frontend_url: String,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    #[serde(skip_serializing)]
    pub smtp_password: String,
    pub from_address: String,
    pub from_name: String,

    /// When false, reset links are logged instead of sent (development mode)
    pub smtp_enabled: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: "noreply@example.com".to_string(),
            from_name: "authcore".to_string(),
            smtp_enabled: false,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| Error::config(format!("Required environment variable {} is not set", key)))
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            auth: AuthConfig {
                jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
                ..AuthConfig::default()
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn default_config_with_secret_validates() {
        assert!(valid_config().validate_all().is_ok());
    }

    #[test]
    fn short_jwt_secret_rejected() {
        let mut config = valid_config();
        config.auth.jwt_secret = "tooshort".to_string();
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn non_sqlite_url_rejected() {
        let mut config = valid_config();
        config.database.url = "mysql://localhost/auth".to_string();
        assert!(config.validate_all().is_err());
    }

    #[test]
    fn bind_address_formatting() {
        let server = ServerConfig { host: "0.0.0.0".to_string(), port: 9000 };
        assert_eq!(server.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn default_ttls_match_documented_values() {
        let auth = AuthConfig::default();
        assert_eq!(auth.access_token_expire_minutes, 15);
        assert_eq!(auth.refresh_token_expire_days, 7);
        assert_eq!(auth.reset_token_expire_minutes, 60);
    }
}
