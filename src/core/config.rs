//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::error::{Error, Result};

/// Default Dataplex REST endpoint.
pub const DEFAULT_DATAPLEX_ENDPOINT: &str = "https://dataplex.googleapis.com";

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Dataplex source configuration.
    pub dataplex: DataplexConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for the Dataplex data scan source.
#[derive(Clone, Serialize, Deserialize)]
pub struct DataplexConfig {
    /// Default Google Cloud project used when a tool call does not name one.
    pub project: String,

    /// Base URL of the Dataplex REST API.
    pub endpoint: String,

    /// Re-authenticate every call with the caller's bearer token instead of
    /// the server's own credentials.
    pub use_client_authorization: bool,

    /// OAuth access token used by the default (server-side) client.
    pub access_token: Option<String>,

    /// Timeout for a single HTTP request to the API.
    pub request_timeout_secs: u64,

    /// Delay between long-running operation polls.
    pub operation_poll_interval_ms: u64,

    /// Upper bound on waiting for a long-running operation.
    pub operation_timeout_secs: u64,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for DataplexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataplexConfig")
            .field("project", &self.project)
            .field("endpoint", &self.endpoint)
            .field("use_client_authorization", &self.use_client_authorization)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("operation_poll_interval_ms", &self.operation_poll_interval_ms)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

impl Default for DataplexConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            endpoint: DEFAULT_DATAPLEX_ENDPOINT.to_string(),
            use_client_authorization: false,
            access_token: None,
            request_timeout_secs: 30,
            operation_poll_interval_ms: 1000,
            operation_timeout_secs: 300,
        }
    }
}

impl DataplexConfig {
    /// Timeout applied to each HTTP request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Interval between operation polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.operation_poll_interval_ms)
    }

    /// Maximum time spent waiting on a long-running operation.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Check the settings that would otherwise only fail at call time.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::config("Dataplex endpoint must not be empty"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(Error::config(format!(
                "Dataplex endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }
        if self.operation_poll_interval_ms == 0 {
            return Err(Error::config(
                "Operation poll interval must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "datascan-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            dataplex: DataplexConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, `MCP_DATAPLEX_PROJECT`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(timestamps) = std::env::var("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = parse_flag(&timestamps).unwrap_or(true);
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        config.dataplex = DataplexConfig::from_env();

        config
    }
}

impl DataplexConfig {
    /// Load the Dataplex source settings from `MCP_DATAPLEX_*` variables.
    pub fn from_env() -> Self {
        let mut dataplex = Self::default();

        if let Ok(project) = std::env::var("MCP_DATAPLEX_PROJECT")
            .or_else(|_| std::env::var("GOOGLE_CLOUD_PROJECT"))
        {
            dataplex.project = project;
        } else {
            warn!(
                "No default project configured. Set MCP_DATAPLEX_PROJECT or \
                 GOOGLE_CLOUD_PROJECT, or pass 'project' to each tool call."
            );
        }

        if let Ok(endpoint) = std::env::var("MCP_DATAPLEX_ENDPOINT") {
            dataplex.endpoint = endpoint.trim_end_matches('/').to_string();
        }

        if let Ok(flag) = std::env::var("MCP_DATAPLEX_USE_CLIENT_OAUTH") {
            dataplex.use_client_authorization = parse_flag(&flag).unwrap_or(false);
            info!(
                "Client authorization: {}",
                dataplex.use_client_authorization
            );
        }

        if let Ok(token) = std::env::var("MCP_DATAPLEX_ACCESS_TOKEN") {
            dataplex.access_token = Some(token);
            info!("Dataplex access token loaded from environment");
        } else if !dataplex.use_client_authorization {
            warn!(
                "MCP_DATAPLEX_ACCESS_TOKEN not set - requests from the default \
                 client will be sent without credentials"
            );
        }

        if let Some(secs) = parse_u64_var("MCP_DATAPLEX_REQUEST_TIMEOUT_SECS") {
            dataplex.request_timeout_secs = secs;
        }

        if let Some(ms) = parse_u64_var("MCP_DATAPLEX_POLL_INTERVAL_MS") {
            dataplex.operation_poll_interval_ms = ms;
        }

        if let Some(secs) = parse_u64_var("MCP_DATAPLEX_OPERATION_TIMEOUT_SECS") {
            dataplex.operation_timeout_secs = secs;
        }

        dataplex
    }
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_u64_var(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: '{}'", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn clear_dataplex_env() {
        for key in [
            "MCP_DATAPLEX_PROJECT",
            "GOOGLE_CLOUD_PROJECT",
            "MCP_DATAPLEX_ENDPOINT",
            "MCP_DATAPLEX_USE_CLIENT_OAUTH",
            "MCP_DATAPLEX_ACCESS_TOKEN",
            "MCP_DATAPLEX_REQUEST_TIMEOUT_SECS",
            "MCP_DATAPLEX_POLL_INTERVAL_MS",
            "MCP_DATAPLEX_OPERATION_TIMEOUT_SECS",
        ] {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_dataplex_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_dataplex_env();
        unsafe {
            std::env::set_var("MCP_DATAPLEX_PROJECT", "analytics-prod");
            std::env::set_var("MCP_DATAPLEX_ENDPOINT", "http://localhost:9090/");
            std::env::set_var("MCP_DATAPLEX_USE_CLIENT_OAUTH", "true");
            std::env::set_var("MCP_DATAPLEX_POLL_INTERVAL_MS", "250");
        }
        let dataplex = DataplexConfig::from_env();
        assert_eq!(dataplex.project, "analytics-prod");
        assert_eq!(dataplex.endpoint, "http://localhost:9090");
        assert!(dataplex.use_client_authorization);
        assert_eq!(dataplex.operation_poll_interval_ms, 250);
        clear_dataplex_env();
    }

    #[test]
    fn test_project_falls_back_to_google_cloud_project() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_dataplex_env();
        unsafe {
            std::env::set_var("GOOGLE_CLOUD_PROJECT", "fallback-project");
        }
        let dataplex = DataplexConfig::from_env();
        assert_eq!(dataplex.project, "fallback-project");
        clear_dataplex_env();
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_dataplex_env();
        unsafe {
            std::env::set_var("MCP_DATAPLEX_OPERATION_TIMEOUT_SECS", "soon");
        }
        let dataplex = DataplexConfig::from_env();
        assert_eq!(dataplex.operation_timeout_secs, 300);
        clear_dataplex_env();
    }

    #[test]
    fn test_access_token_redacted_in_debug() {
        let dataplex = DataplexConfig {
            access_token: Some("ya29.super_secret".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", dataplex);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("ya29.super_secret"));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut dataplex = DataplexConfig::default();
        assert!(dataplex.validate().is_ok());

        dataplex.endpoint = "dataplex.googleapis.com".to_string();
        assert!(dataplex.validate().is_err());

        dataplex.endpoint = String::new();
        assert!(dataplex.validate().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
