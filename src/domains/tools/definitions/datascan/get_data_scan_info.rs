//! Data scan info tool.
//!
//! Fetches one data scan with its full view, exposing the profile result
//! of the latest run.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::core::AccessToken;
use crate::core::dataplex::DataplexSource;
use crate::core::dataplex::types::{DataScanView, GetDataScanRequest};
use crate::domains::tools::ToolError;

use super::common::{DataScanName, api_failure_message, error_result, structured_result};

#[cfg(feature = "http")]
use super::common::http_response;

/// Parameters for fetching a data scan.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetDataScanInfoParams {
    #[schemars(description = "The resource name of the dataScan.")]
    pub name: String,
}

/// Structured output: the scan and its data profile result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataScanInfo {
    pub data_scan_name: String,
    pub display_name: String,
    pub data_source: String,
    pub result: Option<serde_json::Value>,
}

/// Data scan info tool.
pub struct GetDataScanInfoTool;

impl GetDataScanInfoTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "bigquery_get_data_scan_info";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Use this tool to view data profile scan and insight generation scan results.";

    #[instrument(skip_all, fields(name = %params.name))]
    pub async fn execute(
        params: &GetDataScanInfoParams,
        source: &DataplexSource,
        access_token: Option<&AccessToken>,
    ) -> CallToolResult {
        match Self::fetch(params, source, access_token).await {
            Ok(info) => {
                let summary = if info.result.is_some() {
                    format!(
                        "Data scan {} over {} has a data profile result",
                        info.data_scan_name, info.data_source
                    )
                } else {
                    format!(
                        "Data scan {} over {} has no data profile result yet",
                        info.data_scan_name, info.data_source
                    )
                };
                info!("{}", summary);
                structured_result(summary, info)
            }
            Err(e) => error_result(e.message()),
        }
    }

    async fn fetch(
        params: &GetDataScanInfoParams,
        source: &DataplexSource,
        access_token: Option<&AccessToken>,
    ) -> Result<DataScanInfo, ToolError> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(ToolError::invalid_arguments("name is required."));
        }

        let request = GetDataScanRequest {
            name: name.to_string(),
            view: DataScanView::Full,
        };
        debug!("Request: {:?}", request);

        let client = source
            .client(access_token)
            .map_err(|e| ToolError::unauthorized(e.to_string()))?;

        let scan = client.get_data_scan(&request).await.map_err(|e| {
            let project = DataScanName::parse(name)
                .map(|n| n.project)
                .unwrap_or_else(|| source.project().to_string());
            ToolError::execution_failed(api_failure_message("get data scan", &project, &e))
        })?;

        Ok(DataScanInfo {
            data_source: scan.data_resource().to_string(),
            data_scan_name: scan.name,
            display_name: scan.display_name,
            result: scan.data_profile_result,
        })
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        source: Arc<DataplexSource>,
        access_token: Option<AccessToken>,
    ) -> Result<serde_json::Value, String> {
        let params: GetDataScanInfoParams = serde_json::from_value(arguments)
            .map_err(|e| ToolError::invalid_arguments(e.to_string()).to_string())?;

        let result = Self::execute(&params, &source, access_token.as_ref()).await;
        Ok(http_response(result))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<GetDataScanInfoParams>(),
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
                let params: GetDataScanInfoParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

                Ok(Self::execute(&params, &source, None).await)
            }
            .boxed()
        })
    }
}
