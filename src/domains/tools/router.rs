//! Tool Router - builds the rmcp ToolRouter from registry.
//!
//! This module builds the ToolRouter for STDIO/TCP transport by delegating
//! to the tool definitions themselves. Each tool knows how to create its own route.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::core::dataplex::DataplexSource;

use super::definitions::{DataProfileTool, GetDataScanInfoTool, ListDataScansTool};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(source: Arc<DataplexSource>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(DataProfileTool::create_route(source.clone()))
        .with_route(GetDataScanInfoTool::create_route(source.clone()))
        .with_route(ListDataScansTool::create_route(source))
}
