//! List data scans tool.
//!
//! Lists the Dataplex data scans of a project location, newest first,
//! optionally restricted to one scan state.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::core::AccessToken;
use crate::core::dataplex::types::ListDataScansRequest;
use crate::core::dataplex::{DataplexSource, list_all_data_scans};
use crate::domains::tools::ToolError;

use super::common::{
    api_failure_message, default_page_size, error_result, location_parent, require_location,
    resolve_project, state_filter, structured_result, validate_page_size,
};

#[cfg(feature = "http")]
use super::common::http_response;

/// Newest scans first.
const ORDER_BY_CREATE_TIME_DESC: &str = "create_time desc";

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for listing data scans.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListDataScansParams {
    #[schemars(description = "This refers to a Google Cloud region.")]
    pub location: String,

    #[serde(default)]
    #[schemars(
        description = "The Google Cloud project ID. If not provided, the tool defaults to the project from the source configuration."
    )]
    pub project: String,

    #[serde(default)]
    #[schemars(
        description = "State of the datascan, if not provided tool will return datascan with any state."
    )]
    pub state: String,

    #[serde(rename = "pageSize", alias = "page_size", default = "default_page_size")]
    #[schemars(description = "Number of results in the search page.")]
    pub page_size: i32,
}

// ============================================================================
// Structured Output
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataScanItem {
    pub name: String,
    pub create_time: Option<DateTime<Utc>>,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDataScansResult {
    pub data_scans: Vec<DataScanItem>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Data scan listing tool.
pub struct ListDataScansTool;

impl ListDataScansTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "bigquery_list_data_scans";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Use this tool to get a list of data scans of a project.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(location = %params.location))]
    pub async fn execute(
        params: &ListDataScansParams,
        source: &DataplexSource,
        access_token: Option<&AccessToken>,
    ) -> CallToolResult {
        match Self::list(params, source, access_token).await {
            Ok((parent, result)) => {
                let summary = format!(
                    "Found {} data scan(s) in {}",
                    result.data_scans.len(),
                    parent
                );
                info!("{}", summary);
                structured_result(summary, result)
            }
            Err(e) => error_result(e.message()),
        }
    }

    async fn list(
        params: &ListDataScansParams,
        source: &DataplexSource,
        access_token: Option<&AccessToken>,
    ) -> Result<(String, ListDataScansResult), ToolError> {
        let location = require_location(&params.location)?;
        let project = resolve_project(&params.project, source)?;

        let request = ListDataScansRequest {
            parent: location_parent(&project, location),
            page_size: validate_page_size(params.page_size),
            page_token: None,
            filter: state_filter(&params.state),
            order_by: Some(ORDER_BY_CREATE_TIME_DESC.to_string()),
        };
        info!(
            "Listing data scans in {} with state {:?}",
            request.parent, params.state
        );

        let client = source
            .client(access_token)
            .map_err(|e| ToolError::unauthorized(e.to_string()))?;

        let scans = list_all_data_scans(client.as_ref(), &request)
            .await
            .map_err(|e| {
                ToolError::execution_failed(api_failure_message("list data scans", &project, &e))
            })?;

        let data_scans = scans
            .into_iter()
            .map(|scan| DataScanItem {
                state: scan.state_name().to_string(),
                create_time: scan.create_time,
                name: scan.name,
            })
            .collect();

        Ok((request.parent, ListDataScansResult { data_scans }))
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        source: Arc<DataplexSource>,
        access_token: Option<AccessToken>,
    ) -> Result<serde_json::Value, String> {
        let params: ListDataScansParams = serde_json::from_value(arguments)
            .map_err(|e| ToolError::invalid_arguments(e.to_string()).to_string())?;

        let result = Self::execute(&params, &source, access_token.as_ref()).await;
        Ok(http_response(result))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<ListDataScansParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO/TCP transport.
    pub fn create_route<S>(source: Arc<DataplexSource>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let source = source.clone();
            async move {
                let params: ListDataScansParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

                Ok(Self::execute(&params, &source, None).await)
            }
            .boxed()
        })
    }
}
