//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `pockethub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use pockethub_adapter_quotes_reqwest::QuotesConfig;
use pockethub_app::services::refresh_service::DEFAULT_SCAN_INTERVAL;

const CONFIG_FILE: &str = "pockethub.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Quote provider and polling settings.
    pub quotes: QuotesSection,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// `[quotes]` table.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QuotesSection {
    #[serde(flatten)]
    pub provider: QuotesConfig,
    /// Seconds between two polls of every loaded hub.
    pub scan_interval_secs: u64,
}

impl Config {
    /// Load configuration from `pockethub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("POCKETHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("POCKETHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("POCKETHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("POCKETHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("POCKETHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("POCKETHUB_QUOTES_URL") {
            self.quotes.provider.base_url = val;
        }
        if let Some(secs) = var("POCKETHUB_SCAN_INTERVAL").and_then(|val| val.parse().ok()) {
            self.quotes.scan_interval_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.quotes.scan_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scan_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.quotes.provider.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.quotes.scan_interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:pockethub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "pockethubd=info,pockethub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for QuotesSection {
    fn default() -> Self {
        Self {
            provider: QuotesConfig::default(),
            scan_interval_secs: DEFAULT_SCAN_INTERVAL.as_secs(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.database_url(), "sqlite:pockethub.db?mode=rwc");
        assert_eq!(config.scan_interval(), Duration::from_secs(300));
        assert_eq!(config.quotes.provider.timeout_secs, 10);
        assert_eq!(
            config.quotes.provider.base_url,
            "https://component-api.wertpapiere.ing.de"
        );
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.quotes.scan_interval_secs, 300);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [quotes]
            base_url = 'http://localhost:8081'
            timeout_secs = 3
            scan_interval_secs = 60
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.quotes.provider.base_url, "http://localhost:8081");
        assert_eq!(config.quotes.provider.timeout_secs, 3);
        assert_eq!(config.scan_interval(), Duration::from_secs(60));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_let_environment_override_file_values() {
        let mut config = Config::default();

        config.apply_env_overrides(env(&[
            ("POCKETHUB_BIND", "127.0.0.1:8123"),
            ("POCKETHUB_DATABASE_URL", "sqlite::memory:"),
            ("POCKETHUB_LOG", "warn"),
            ("POCKETHUB_QUOTES_URL", "http://upstream"),
            ("POCKETHUB_SCAN_INTERVAL", "45"),
        ]));

        assert_eq!(config.bind_addr(), "127.0.0.1:8123");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "warn");
        assert_eq!(config.quotes.provider.base_url, "http://upstream");
        assert_eq!(config.scan_interval(), Duration::from_secs(45));
    }

    #[test]
    fn should_prefer_rust_log_over_pockethub_log() {
        let mut config = Config::default();

        config.apply_env_overrides(env(&[("POCKETHUB_LOG", "warn"), ("RUST_LOG", "trace")]));

        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_numbers() {
        let mut config = Config::default();

        config.apply_env_overrides(env(&[
            ("POCKETHUB_PORT", "http"),
            ("POCKETHUB_SCAN_INTERVAL", "soon"),
        ]));

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.quotes.scan_interval_secs, 300);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_scan_interval_and_timeout() {
        let mut config = Config::default();
        config.quotes.scan_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.quotes.provider.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
