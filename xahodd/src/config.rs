//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use std::time::Duration;

/// Default per-request timeout for the data API
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Data API collaborator configuration
    pub data_api: DataApiConfig,

    /// Log output format
    pub log_format: LogFormat,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Data API configuration.
#[derive(Debug, Clone)]
pub struct DataApiConfig {
    /// Base URL; without one the daemon serves sample data
    pub base_url: Option<String>,
    /// Bearer token for every request
    pub auth_token: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (uses stubs)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DaemonResult<Self> {
        let environment = Self::load_environment(&lookup)?;
        let api = Self::load_api_config(&lookup)?;
        let data_api = Self::load_data_api_config(&lookup)?;
        let log_format = Self::load_log_format(&lookup)?;

        if environment == Environment::Production && data_api.base_url.is_none() {
            return Err(DaemonError::Config(
                "XAHOD_DATA_API_URL is required in production".to_string(),
            ));
        }

        Ok(Self {
            api,
            data_api,
            log_format,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            data_api: DataApiConfig {
                base_url: None,
                auth_token: None,
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Test,
        }
    }

    fn load_environment(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<Environment> {
        let env_str = lookup("XAHOD_ENV").unwrap_or_else(|| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid XAHOD_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_api_config(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<ApiConfig> {
        let host = lookup("XAHOD_API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port_str = lookup("XAHOD_API_PORT").unwrap_or_else(|| "8080".to_string());

        let port = port_str
            .parse::<u16>()
            .map_err(|_| DaemonError::Config(format!("Invalid XAHOD_API_PORT: {}", port_str)))?;

        Ok(ApiConfig { host, port })
    }

    fn load_data_api_config(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> DaemonResult<DataApiConfig> {
        let base_url = lookup("XAHOD_DATA_API_URL").filter(|s| !s.trim().is_empty());
        let auth_token = lookup("XAHOD_AUTH_TOKEN").filter(|s| !s.is_empty());

        let request_timeout = match lookup("XAHOD_REQUEST_TIMEOUT_SECS") {
            Some(val) => {
                let secs = val.parse::<u64>().ok().filter(|s| *s > 0).ok_or_else(|| {
                    DaemonError::Config(format!("Invalid XAHOD_REQUEST_TIMEOUT_SECS: {}", val))
                })?;
                Duration::from_secs(secs)
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(DataApiConfig {
            base_url,
            auth_token,
            request_timeout,
        })
    }

    fn load_log_format(lookup: &impl Fn(&str) -> Option<String>) -> DaemonResult<LogFormat> {
        match lookup("XAHOD_LOG_FORMAT").map(|s| s.to_lowercase()).as_deref() {
            None | Some("pretty") | Some("text") => Ok(LogFormat::Pretty),
            Some("json") => Ok(LogFormat::Json),
            Some(other) => Err(DaemonError::Config(format!(
                "Invalid XAHOD_LOG_FORMAT: {}. Expected: pretty, json",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            data_api: DataApiConfig {
                base_url: None,
                auth_token: None,
                request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.data_api.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.environment, Environment::Test);
        assert!(config.data_api.base_url.is_none());
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_from_lookup_reads_everything() {
        let config = Config::from_lookup(lookup(&[
            ("XAHOD_ENV", "prod"),
            ("XAHOD_API_HOST", "127.0.0.1"),
            ("XAHOD_API_PORT", "9000"),
            ("XAHOD_DATA_API_URL", "http://localhost:4280"),
            ("XAHOD_AUTH_TOKEN", "abc"),
            ("XAHOD_REQUEST_TIMEOUT_SECS", "3"),
            ("XAHOD_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.data_api.base_url.as_deref(), Some("http://localhost:4280"));
        assert_eq!(config.data_api.auth_token.as_deref(), Some("abc"));
        assert_eq!(config.data_api.request_timeout, Duration::from_secs(3));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for vars in [
            vec![("XAHOD_ENV", "staging")],
            vec![("XAHOD_API_PORT", "http")],
            vec![("XAHOD_REQUEST_TIMEOUT_SECS", "0")],
            vec![("XAHOD_LOG_FORMAT", "xml")],
            vec![("XAHOD_ENV", "production")],
        ] {
            let result = Config::from_lookup(lookup(&vars));
            assert!(matches!(result, Err(DaemonError::Config(_))), "{:?}", vars);
        }
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
