use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Production mode marks the session cookie `Secure`
    #[serde(default)]
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            production: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens; empty means generate one at startup
    #[serde(default)]
    pub session_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// Stripe secret key (sk_live_... / sk_test_...)
    #[serde(default = "default_stripe_secret_key")]
    pub stripe_secret_key: String,
    /// Base URL of the Stripe REST API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: default_stripe_secret_key(),
            api_base: default_api_base(),
            currency: default_currency(),
        }
    }
}

fn default_stripe_secret_key() -> String {
    "sk_test_placeholder".to_string()
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

#[derive(Debug, Clone, Deserialize)]
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

/// Environment variables that override file settings
pub const ENV_SESSION_SECRET: &str = "MEDFLOW_SESSION_SECRET";
pub const ENV_STRIPE_SECRET_KEY: &str = "STRIPE_SECRET_KEY";
pub const ENV_MODE: &str = "MEDFLOW_ENV";

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(ENV_SESSION_SECRET).filter(|s| !s.is_empty()) {
            self.auth.session_secret = secret;
        }
        if let Some(key) = lookup(ENV_STRIPE_SECRET_KEY).filter(|s| !s.is_empty()) {
            self.payments.stripe_secret_key = key;
        }
        if let Some(mode) = lookup(ENV_MODE) {
            self.server.production = mode.eq_ignore_ascii_case("production");
        }
    }

    /// Generate a random session secret if none was configured
    pub fn ensure_session_secret(&mut self) {
        if self.auth.session_secret.is_empty() {
            warn!(
                "No session secret configured; sessions will not survive a restart (set {})",
                ENV_SESSION_SECRET
            );
            self.auth.session_secret = uuid::Uuid::new_v4().to_string();
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            payments: PaymentsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(!config.server.production);
        assert_eq!(config.payments.currency, "usd");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            [server]
            port = 8088
            production = true

            [auth]
            session_secret = "file-secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8088);
        assert!(config.server.production);
        assert_eq!(config.auth.session_secret, "file-secret");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_missing_session_secret_is_generated() {
        let mut config = Config::default();
        assert!(config.auth.session_secret.is_empty());
        config.ensure_session_secret();
        assert!(!config.auth.session_secret.is_empty());

        let mut configured = Config::parse("[auth]\nsession_secret = \"fixed\"").unwrap();
        configured.ensure_session_secret();
        assert_eq!(configured.auth.session_secret, "fixed");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            ENV_SESSION_SECRET => Some("env-secret".to_string()),
            ENV_STRIPE_SECRET_KEY => Some("sk_test_env".to_string()),
            ENV_MODE => Some("Production".to_string()),
            _ => None,
        });
        assert_eq!(config.auth.session_secret, "env-secret");
        assert_eq!(config.payments.stripe_secret_key, "sk_test_env");
        assert!(config.server.production);
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = Config::parse("[auth]\nsession_secret = \"keep\"").unwrap();
        config.apply_env(|key| match key {
            ENV_SESSION_SECRET => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.auth.session_secret, "keep");
    }
}
