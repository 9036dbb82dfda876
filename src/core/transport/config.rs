//! Transport configuration types.

use serde::{Deserialize, Serialize};

#[cfg(any(feature = "tcp", feature = "http"))]
use crate::core::config::parse_u64_var;
#[cfg(feature = "http")]
use crate::core::config::parse_flag;

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// TCP socket transport with JSON-RPC messages.
    #[cfg(feature = "tcp")]
    Tcp(TcpConfig),

    /// HTTP transport with JSON-RPC over POST. The only transport that
    /// forwards the caller's `Authorization` header to the tools.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// TCP transport configuration.
#[cfg(feature = "tcp")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Path for the JSON-RPC endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(any(feature = "tcp", feature = "http"))]
fn port_var(key: &str, default: u16) -> u16 {
    parse_u64_var(key)
        .and_then(|p| u16::try_from(p).ok())
        .unwrap_or(default)
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
        {
            return Self::Tcp(TcpConfig::default());
        }

        #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "tcp", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio, tcp, or http");
        }
    }
}

#[cfg(feature = "tcp")]
impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: default_host(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
        }
    }
}

impl TransportConfig {
    /// Load transport config from `MCP_TRANSPORT` and the per-transport variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "tcp")]
            "tcp" => Self::Tcp(TcpConfig {
                port: port_var("MCP_TCP_PORT", 3000),
                host: std::env::var("MCP_TCP_HOST").unwrap_or_else(|_| default_host()),
            }),
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig {
                port: port_var("MCP_HTTP_PORT", 8080),
                host: std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host()),
                rpc_path: std::env::var("MCP_HTTP_PATH").unwrap_or_else(|_| default_rpc_path()),
                enable_cors: std::env::var("MCP_HTTP_CORS")
                    .ok()
                    .and_then(|v| parse_flag(&v))
                    .unwrap_or_else(default_cors),
            }),
            #[cfg(feature = "stdio")]
            _ => Self::Stdio,
            #[cfg(all(not(feature = "stdio"), feature = "tcp"))]
            _ => Self::Tcp(TcpConfig::default()),
            #[cfg(all(not(feature = "stdio"), not(feature = "tcp"), feature = "http"))]
            _ => Self::Http(HttpConfig::default()),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "tcp")]
            Self::Tcp(cfg) => format!("TCP on {}:{}", cfg.host, cfg.port),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.rpc_path),
        }
    }

    /// Whether tool calls on this transport can carry caller credentials.
    pub fn forwards_authorization(&self) -> bool {
        #[cfg(feature = "http")]
        {
            matches!(self, Self::Http(_))
        }
        #[cfg(not(feature = "http"))]
        {
            false
        }
    }
}
