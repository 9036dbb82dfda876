//! Data profile tool.
//!
//! Creates an on-demand Dataplex data profile scan over a BigQuery table,
//! waits for the scan to exist and, unless told otherwise, starts a run so
//! the statistics become available through `bigquery_get_data_scan_info`.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::core::dataplex::types::{
    CreateDataScanRequest, DataProfileSpec, DataScan, DataSource, ExecutionSpec, NewDataScan,
};
use crate::core::dataplex::{DataplexSource, wait_for_operation};
use crate::core::{AccessToken, DataplexError};
use crate::domains::tools::ToolError;

use super::common::{
    BigQueryTableRef, api_failure_message, derive_data_scan_id, error_result,
    is_valid_data_scan_id, location_parent, require_location, resolve_project,
    structured_result,
};

#[cfg(feature = "http")]
use super::common::http_response;

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DataProfileParams {
    #[schemars(
        description = "The BigQuery table to profile: project.dataset.table, dataset.table (in the source project), or //bigquery.googleapis.com/projects/P/datasets/D/tables/T."
    )]
    pub table: String,

    #[schemars(description = "This refers to a Google Cloud region.")]
    pub location: String,

    #[serde(default)]
    #[schemars(
        description = "The Google Cloud project that owns the scan. Defaults to the project from the source configuration."
    )]
    pub project: String,

    #[serde(rename = "dataScanId", alias = "data_scan_id", default)]
    #[schemars(
        description = "ID of the scan to create. Defaults to one derived from the table name."
    )]
    pub data_scan_id: String,

    #[serde(rename = "displayName", alias = "display_name", default)]
    #[schemars(description = "Display name of the scan. Defaults to the table name.")]
    pub display_name: String,

    #[serde(
        rename = "samplingPercent",
        alias = "sampling_percent",
        default = "default_sampling_percent"
    )]
    #[schemars(description = "Percentage of rows to sample, greater than 0 and at most 100 (default: 10).")]
    pub sampling_percent: f64,

    #[serde(default = "default_run")]
    #[schemars(description = "Start a profiling run once the scan is created (default: true).")]
    pub run: bool,
}

fn default_sampling_percent() -> f64 {
    10.0
}

fn default_run() -> bool {
    true
}

// ============================================================================
// Structured Output
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProfileResult {
    pub data_scan_name: String,
    pub display_name: String,
    pub data_source: String,
    pub state: String,
    pub job_name: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Data profile scan creation tool.
pub struct DataProfileTool;

impl DataProfileTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "bigquery_data_profile";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Use this tool to analyze and understand tables by generating statistical insights.";

    #[instrument(skip_all, fields(table = %params.table))]
    pub async fn execute(
        params: &DataProfileParams,
        source: &DataplexSource,
        access_token: Option<&AccessToken>,
    ) -> CallToolResult {
        match Self::profile(params, source, access_token).await {
            Ok(result) => {
                let summary = match &result.job_name {
                    Some(job) => format!(
                        "Created data profile scan {} over {} and started job {}",
                        result.data_scan_name, result.data_source, job
                    ),
                    None => format!(
                        "Created data profile scan {} over {}",
                        result.data_scan_name, result.data_source
                    ),
                };
                info!("{}", summary);
                structured_result(summary, result)
            }
            Err(e) => error_result(e.message()),
        }
    }

    /// Build the create request. The scan lives in `project`; a
    /// `dataset.table` reference is resolved against `table_project`.
    fn build_request(
        params: &DataProfileParams,
        location: &str,
        project: &str,
        table_project: &str,
    ) -> Result<CreateDataScanRequest, ToolError> {
        let table = BigQueryTableRef::parse(&params.table, table_project)?;

        if !(params.sampling_percent > 0.0 && params.sampling_percent <= 100.0) {
            return Err(ToolError::invalid_arguments(format!(
                "samplingPercent must be greater than 0 and at most 100, got {}",
                params.sampling_percent
            )));
        }

        let data_scan_id = match params.data_scan_id.trim() {
            "" => derive_data_scan_id(&table),
            id if is_valid_data_scan_id(id) => id.to_string(),
            id => {
                return Err(ToolError::invalid_arguments(format!(
                    "invalid dataScanId '{}': use 1-63 lowercase letters, digits or hyphens, \
                     starting with a letter and not ending with a hyphen",
                    id
                )));
            }
        };

        let display_name = match params.display_name.trim() {
            "" => table.table.clone(),
            name => name.to_string(),
        };

        Ok(CreateDataScanRequest {
            parent: location_parent(project, location),
            data_scan_id,
            data_scan: NewDataScan {
                display_name,
                description: format!("Data profile of {}", table),
                data: DataSource::resource(table.resource_name()),
                execution_spec: ExecutionSpec::default(),
                data_profile_spec: DataProfileSpec {
                    sampling_percent: params.sampling_percent,
                },
            },
        })
    }

    async fn profile(
        params: &DataProfileParams,
        source: &DataplexSource,
        access_token: Option<&AccessToken>,
    ) -> Result<DataProfileResult, ToolError> {
        let location = require_location(&params.location)?;
        let project = resolve_project(&params.project, source)?;
        let table_project = match source.project() {
            "" => project.as_str(),
            configured => configured,
        };
        let request = Self::build_request(params, location, &project, table_project)?;
        debug!("Request: {:?}", request);

        let failed = |e: DataplexError| {
            ToolError::execution_failed(api_failure_message("create data scan", &project, &e))
        };

        let client = source
            .client(access_token)
            .map_err(|e| ToolError::unauthorized(e.to_string()))?;

        let operation = client.create_data_scan(&request).await.map_err(failed)?;
        let config = source.config();
        let done = wait_for_operation(
            client.as_ref(),
            operation,
            config.poll_interval(),
            config.operation_timeout(),
        )
        .await
        .map_err(failed)?;

        let created = Self::created_scan(&request, done.response);

        let job_name = if params.run {
            let run = client.run_data_scan(&created.name).await.map_err(|e| {
                ToolError::execution_failed(format!(
                    "data scan {} was created but could not be run: {}",
                    created.name, e
                ))
            })?;
            Some(run.job.name)
        } else {
            None
        };

        Ok(DataProfileResult {
            data_source: created.data_resource().to_string(),
            state: created.state_name().to_string(),
            data_scan_name: created.name,
            display_name: created.display_name,
            job_name,
        })
    }

    /// The scan carried in the finished operation, or one rebuilt from the
    /// request when the operation has no usable response.
    fn created_scan(request: &CreateDataScanRequest, response: Option<serde_json::Value>) -> DataScan {
        let decoded = response.and_then(|value| match serde_json::from_value::<DataScan>(value) {
            Ok(scan) if !scan.name.is_empty() => Some(scan),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not decode created data scan: {}", e);
                None
            }
        });

        decoded.unwrap_or_else(|| DataScan {
            name: format!("{}/dataScans/{}", request.parent, request.data_scan_id),
            display_name: request.data_scan.display_name.clone(),
            data: Some(request.data_scan.data.clone()),
            ..Default::default()
        })
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        source: Arc<DataplexSource>,
        access_token: Option<AccessToken>,
    ) -> Result<serde_json::Value, String> {
        let params: DataProfileParams = serde_json::from_value(arguments)
            .map_err(|e| ToolError::invalid_arguments(e.to_string()).to_string())?;

        let result = Self::execute(&params, &source, access_token.as_ref()).await;
        Ok(http_response(result))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<DataProfileParams>(),
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
                let params: DataProfileParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

                Ok(Self::execute(&params, &source, None).await)
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataplexError;
    use crate::core::config::DataplexConfig;
    use crate::core::dataplex::testing::{FakeClientCreator, FakeDataScanApi, fake_source};
    use crate::core::dataplex::types::{Operation, Status};

    fn params(json: serde_json::Value) -> DataProfileParams {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_params_defaults() {
        let p = params(serde_json::json!({ "table": "sales.orders", "location": "us-west1" }));
        assert_eq!(p.sampling_percent, 10.0);
        assert!(p.run);
        assert_eq!(p.data_scan_id, "");
    }

    #[test]
    fn test_build_request() {
        let request = DataProfileTool::build_request(
            &params(serde_json::json!({
                "table": "sales.Orders",
                "location": "us-west1",
                "samplingPercent": 25.5
            })),
            "us-west1",
            "test-project",
            "test-project",
        )
        .unwrap();

        assert_eq!(request.parent, "projects/test-project/locations/us-west1");
        assert_eq!(request.data_scan_id, "orders-profile");
        assert_eq!(request.data_scan.display_name, "Orders");
        assert_eq!(
            request.data_scan.data.resource.as_deref(),
            Some("//bigquery.googleapis.com/projects/test-project/datasets/sales/tables/Orders")
        );
        assert_eq!(request.data_scan.data_profile_spec.sampling_percent, 25.5);
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        let bad = [
            serde_json::json!({ "table": "orders", "location": "l" }),
            serde_json::json!({ "table": "sales.orders", "location": "l", "samplingPercent": 0.0 }),
            serde_json::json!({ "table": "sales.orders", "location": "l", "samplingPercent": 100.5 }),
            serde_json::json!({ "table": "sales.orders", "location": "l", "dataScanId": "Bad_Id" }),
        ];
        for json in bad {
            let result = DataProfileTool::build_request(
                &params(json.clone()),
                "l",
                "test-project",
                "test-project",
            );
            assert!(
                matches!(result, Err(ToolError::InvalidArguments(_))),
                "expected {} to be rejected",
                json
            );
        }
    }

    #[tokio::test]
    async fn test_creates_and_runs_scan() {
        let fake = FakeDataScanApi::new();
        let source = fake_source(fake.clone());

        let result = DataProfileTool::execute(
            &params(serde_json::json!({
                "table": "analytics.sales.orders",
                "location": "us-west1",
                "dataScanId": "orders-weekly"
            })),
            &source,
            None,
        )
        .await;

        assert_eq!(result.is_error, Some(false));
        let structured = result.structured_content.unwrap();
        assert_eq!(
            structured["dataScanName"],
            "projects/test-project/locations/us-west1/dataScans/orders-weekly"
        );
        assert_eq!(
            structured["dataSource"],
            "//bigquery.googleapis.com/projects/analytics/datasets/sales/tables/orders"
        );
        assert_eq!(structured["state"], "ACTIVE");
        assert_eq!(
            structured["jobName"],
            "projects/test-project/locations/us-west1/dataScans/orders-weekly/jobs/job-1"
        );

        assert_eq!(fake.create_requests().len(), 1);
        assert_eq!(
            fake.runs(),
            vec!["projects/test-project/locations/us-west1/dataScans/orders-weekly".to_string()]
        );
    }

    #[tokio::test]
    async fn test_run_can_be_skipped() {
        let fake = FakeDataScanApi::new();
        let source = fake_source(fake.clone());

        let result = DataProfileTool::execute(
            &params(serde_json::json!({
                "table": "sales.orders",
                "location": "us-west1",
                "run": false
            })),
            &source,
            None,
        )
        .await;

        assert_eq!(result.is_error, Some(false));
        assert!(result.structured_content.unwrap()["jobName"].is_null());
        assert!(fake.runs().is_empty());
    }

    #[tokio::test]
    async fn test_waits_for_pending_operation() {
        let fake = FakeDataScanApi::new()
            .with_create_response(Ok(Operation {
                name: "projects/test-project/locations/us-west1/operations/op-9".to_string(),
                done: false,
                ..Default::default()
            }))
            .with_operation_polls(vec![Operation {
                name: "projects/test-project/locations/us-west1/operations/op-9".to_string(),
                done: true,
                response: None,
                ..Default::default()
            }]);
        let source = fake_source(fake.clone());

        let result = DataProfileTool::execute(
            &params(serde_json::json!({
                "table": "sales.orders",
                "location": "us-west1",
                "run": false
            })),
            &source,
            None,
        )
        .await;

        assert_eq!(result.is_error, Some(false));
        assert_eq!(fake.operation_polls(), 1);
        let structured = result.structured_content.unwrap();
        assert_eq!(
            structured["dataScanName"],
            "projects/test-project/locations/us-west1/dataScans/orders-profile"
        );
        assert_eq!(structured["state"], "STATE_UNSPECIFIED");
    }

    #[tokio::test]
    async fn test_create_failure_names_project() {
        let fake = FakeDataScanApi::new()
            .with_create_response(Err(DataplexError::api(409, "DataScan already exists")));
        let source = fake_source(fake.clone());

        let result = DataProfileTool::execute(
            &params(serde_json::json!({ "table": "sales.orders", "location": "us-west1" })),
            &source,
            None,
        )
        .await;

        assert_eq!(result.is_error, Some(true));
        let text = format!("{:?}", result.content);
        assert!(text.contains("failed to create data scan for project"));
        assert!(text.contains("DataScan already exists"));
        assert!(fake.runs().is_empty());
    }

    #[tokio::test]
    async fn test_failed_operation_is_reported() {
        let fake = FakeDataScanApi::new().with_create_response(Ok(Operation {
            name: "op".to_string(),
            done: true,
            error: Some(Status {
                code: 7,
                message: "caller lacks bigquery.tables.get".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }));
        let source = fake_source(fake);

        let result = DataProfileTool::execute(
            &params(serde_json::json!({ "table": "sales.orders", "location": "us-west1" })),
            &source,
            None,
        )
        .await;

        assert_eq!(result.is_error, Some(true));
        assert!(format!("{:?}", result.content).contains("caller lacks bigquery.tables.get"));
    }

    #[tokio::test]
    async fn test_dataset_table_resolves_against_source_project() {
        let fake = FakeDataScanApi::new();
        let source = fake_source(fake.clone());

        let result = DataProfileTool::execute(
            &params(serde_json::json!({
                "table": "sales.orders",
                "location": "us-west1",
                "project": "scan-owner",
                "run": false
            })),
            &source,
            None,
        )
        .await;

        assert_eq!(result.is_error, Some(false));
        let requests = fake.create_requests();
        assert_eq!(requests[0].parent, "projects/scan-owner/locations/us-west1");
        assert_eq!(
            requests[0].data_scan.data.resource.as_deref(),
            Some("//bigquery.googleapis.com/projects/test-project/datasets/sales/tables/orders")
        );
    }

    #[tokio::test]
    async fn test_empty_location_is_rejected_before_project() {
        let fake = FakeDataScanApi::new();
        let source = DataplexSource::with_clients(
            DataplexConfig::default(),
            Arc::new(fake.clone()),
            Arc::new(FakeClientCreator::new(fake.clone())),
        );

        let result = DataProfileTool::execute(
            &params(serde_json::json!({ "table": "sales.orders", "location": "" })),
            &source,
            None,
        )
        .await;

        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            format!("{:?}", result.content),
            format!("{:?}", error_result("location parameter is required").content)
        );
        assert!(fake.create_requests().is_empty());
    }
}
