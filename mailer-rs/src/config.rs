//! Configuration for mailer-rs
//!
//! Loaded from a TOML file, then overridden by `MAILER__SECTION__KEY`
//! environment variables (e.g. `MAILER__TRANSPORT__SMTP__HOST`).

use crate::error::{MailerError, Result};
use crate::utils::validate_email;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "MAILER";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub sender: SenderConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// HTTP API listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Public origin used to build tracking URLs
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Identity placed in the From header
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SenderConfig {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Provider tag: `smtp` or `log`
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub security: SmtpSecurity,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS (usually port 465)
    Tls,
    /// Plain connection upgraded with STARTTLS (usually port 587)
    #[default]
    Starttls,
    /// No encryption (local relays, test sinks)
    None,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Maximum sends in flight during a batch
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_provider() -> String {
    "smtp".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_timeout() -> u64 {
    30
}

fn default_concurrency() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            base_url: default_base_url(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            smtp: None,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, without environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MailerError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| MailerError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional TOML file layered with
    /// `MAILER__*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Local development configuration: log transport, localhost URLs
    pub fn development() -> Self {
        Self {
            server: ServerConfig::default(),
            sender: SenderConfig {
                address: "campaigns@example.com".to_string(),
                name: Some("Security Awareness".to_string()),
            },
            transport: TransportConfig {
                provider: "log".to_string(),
                smtp: None,
            },
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: default_log_format(),
            },
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.sender.address)
            .map_err(|e| MailerError::Config(format!("sender.address: {}", e)))?;

        let base_url = self.server.base_url.as_str();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(MailerError::Config(format!(
                "server.base_url must be an http(s) URL, got {}",
                base_url
            )));
        }

        if self.dispatch.concurrency == 0 {
            return Err(MailerError::Config(
                "dispatch.concurrency must be at least 1".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(MailerError::Config(format!(
                "logging.format must be pretty or json, got {}",
                self.logging.format
            )));
        }

        if let Some(smtp) = &self.transport.smtp {
            if smtp.host.trim().is_empty() {
                return Err(MailerError::Config(
                    "transport.smtp.host is empty".to_string(),
                ));
            }
            if smtp.username.is_some() != smtp.password.is_some() {
                return Err(MailerError::Config(
                    "transport.smtp.username and password must be set together".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [sender]
        address = "it-security@corp.example"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server.base_url, "http://localhost:8080");
        assert_eq!(config.transport.provider, "smtp");
        assert!(config.transport.smtp.is_none());
        assert_eq!(config.dispatch.concurrency, 8);
        assert_eq!(config.logging.level, "info");
        assert!(config.sender.name.is_none());
    }

    #[test]
    fn test_full_smtp_config() {
        let config = Config::from_toml_str(
            r#"
            [server]
            base_url = "https://track.corp.example"

            [sender]
            address = "it-security@corp.example"
            name = "IT Security"

            [transport]
            provider = "smtp"

            [transport.smtp]
            host = "smtp.corp.example"
            port = 465
            username = "mailer"
            password = "secret"
            security = "tls"
            "#,
        )
        .unwrap();

        let smtp = config.transport.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.corp.example");
        assert_eq!(smtp.port, 465);
        assert_eq!(smtp.security, SmtpSecurity::Tls);
        assert_eq!(smtp.timeout_seconds, 30);
        assert_eq!(config.sender.name.as_deref(), Some("IT Security"));
    }

    #[test]
    fn test_smtp_defaults() {
        let config = Config::from_toml_str(
            r#"
            [sender]
            address = "a@corp.example"

            [transport.smtp]
            host = "localhost"
            "#,
        )
        .unwrap();

        let smtp = config.transport.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.security, SmtpSecurity::Starttls);
        assert!(smtp.username.is_none());
    }

    #[test]
    fn test_rejects_invalid_sender() {
        let result = Config::from_toml_str(
            r#"
            [sender]
            address = "not-an-address"
            "#,
        );
        assert!(matches!(result, Err(MailerError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let result = Config::from_toml_str(
            r#"
            [server]
            base_url = "track.corp.example"

            [sender]
            address = "a@corp.example"
            "#,
        );
        assert!(matches!(result, Err(MailerError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let result = Config::from_toml_str(
            r#"
            [sender]
            address = "a@corp.example"

            [dispatch]
            concurrency = 0
            "#,
        );
        assert!(matches!(result, Err(MailerError::Config(_))));
    }

    #[test]
    fn test_rejects_half_credentials() {
        let result = Config::from_toml_str(
            r#"
            [sender]
            address = "a@corp.example"

            [transport.smtp]
            host = "localhost"
            username = "mailer"
            "#,
        );
        assert!(matches!(result, Err(MailerError::Config(_))));
    }

    #[test]
    fn test_missing_sender_is_parse_error() {
        let result = Config::from_toml_str("[server]\nlisten_addr = \"127.0.0.1:1\"\n");
        assert!(matches!(result, Err(MailerError::Config(_))));
    }

    #[test]
    fn test_development_config_is_valid() {
        let config = Config::development();
        assert!(config.validate().is_ok());
        assert_eq!(config.transport.provider, "log");
    }
}
