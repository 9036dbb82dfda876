//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tools domain.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! Each tool defines:
//! - Parameters struct (for rmcp)
//! - `execute()` method (core logic)
//! - `http_handler()` method (called via ToolRegistry for HTTP transport)
//!
//! The ToolRouter is built dynamically in `domains/tools/router.rs`.
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;

use super::config::Config;
use super::dataplex::DataplexSource;
use crate::domains::tools::build_tool_router;

#[cfg(feature = "http")]
use super::auth::AccessToken;
#[cfg(feature = "http")]
use crate::domains::tools::ToolRegistry;

const INSTRUCTIONS: &str = "This server exposes Google Cloud Dataplex data scans over BigQuery \
     tables. Use bigquery_list_data_scans to find scans in a project location, \
     bigquery_get_data_scan_info to read a scan's data profile result, and \
     bigquery_data_profile to create and run a new data profile scan for a table.";

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp and routes
/// tool calls to the data scan tools.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// The Dataplex source every tool talks to.
    source: Arc<DataplexSource>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> super::error::Result<Self> {
        config.dataplex.validate()?;
        let source = DataplexSource::from_config(config.dataplex.clone())?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a server around an already-built source.
    pub fn with_source(config: Config, source: Arc<DataplexSource>) -> Self {
        Self {
            tool_router: build_tool_router::<Self>(source.clone()),
            config: Arc::new(config),
            source,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the Dataplex source.
    pub fn source(&self) -> &Arc<DataplexSource> {
        &self.source
    }

    /// Usage instructions reported to clients.
    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// This method uses the ToolRegistry to dispatch to the appropriate
    /// tool handler, passing along the caller's `Authorization` header.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        access_token: Option<AccessToken>,
    ) -> Result<serde_json::Value, String> {
        let registry = ToolRegistry::new(self.source.clone());
        registry.call_tool(name, arguments, access_token).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
