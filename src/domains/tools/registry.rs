//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - HTTP dispatch for tool calls (when http feature is enabled)
//! - Tool metadata for listing

use std::sync::Arc;
#[cfg(feature = "http")]
use tracing::warn;

use rmcp::model::Tool;

use crate::core::dataplex::DataplexSource;

#[cfg(feature = "http")]
use crate::core::AccessToken;
#[cfg(feature = "http")]
use super::ToolError;

use super::definitions::{DataProfileTool, GetDataScanInfoTool, ListDataScansTool};

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// This struct provides a central point for:
/// - Listing all available tools
/// - Dispatching HTTP tool calls (when http feature is enabled)
pub struct ToolRegistry {
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    source: Arc<DataplexSource>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(source: Arc<DataplexSource>) -> Self {
        Self { source }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            DataProfileTool::NAME,
            GetDataScanInfoTool::NAME,
            ListDataScansTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for all available tools.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            DataProfileTool::to_tool(),
            GetDataScanInfoTool::to_tool(),
            ListDataScansTool::to_tool(),
        ]
    }

    /// Dispatch an HTTP tool call to the appropriate handler.
    ///
    /// `access_token` is the caller's `Authorization` header, if any.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        access_token: Option<AccessToken>,
    ) -> Result<serde_json::Value, String> {
        let source = self.source.clone();
        match name {
            DataProfileTool::NAME => {
                DataProfileTool::http_handler(arguments, source, access_token).await
            }
            GetDataScanInfoTool::NAME => {
                GetDataScanInfoTool::http_handler(arguments, source, access_token).await
            }
            ListDataScansTool::NAME => {
                ListDataScansTool::http_handler(arguments, source, access_token).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::not_found(name).to_string())
            }
        }
    }
}
