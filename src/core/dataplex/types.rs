//! Request and response types for the Dataplex `dataScans` REST API.
//!
//! Only the fields the tools read or write are modelled; everything else in
//! a response is ignored on decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State reported when the API omits one.
pub const STATE_UNSPECIFIED: &str = "STATE_UNSPECIFIED";

// ============================================================================
// Resources
// ============================================================================

/// A data scan resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataScan {
    /// `projects/{project}/locations/{location}/dataScans/{id}`
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub state: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub data: Option<DataSource>,
    #[serde(rename = "type")]
    pub scan_type: Option<String>,
    pub data_profile_result: Option<serde_json::Value>,
}

impl DataScan {
    /// The state name, `STATE_UNSPECIFIED` when missing.
    pub fn state_name(&self) -> &str {
        self.state.as_deref().unwrap_or(STATE_UNSPECIFIED)
    }

    /// The scanned resource, empty when the scan targets an entity instead.
    pub fn data_resource(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|d| d.resource.as_deref())
            .unwrap_or_default()
    }
}

/// The data a scan runs against: either a service resource or a Dataplex entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl DataSource {
    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            entity: None,
        }
    }
}

/// A single run of a data scan.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataScanJob {
    pub name: String,
    pub state: Option<String>,
}

/// Body returned by `dataScans.run`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunDataScanResponse {
    pub job: DataScanJob,
}

/// Body returned by `dataScans.list`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListDataScansResponse {
    pub data_scans: Vec<DataScan>,
    pub next_page_token: Option<String>,
    pub unreachable: Vec<String>,
}

/// A long-running operation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub name: String,
    pub done: bool,
    pub error: Option<Status>,
    pub response: Option<serde_json::Value>,
}

/// A `google.rpc.Status`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Status {
    pub code: i32,
    pub message: String,
    pub status: String,
}

/// The error envelope Google APIs wrap failures in.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: Status,
}

// ============================================================================
// Data scan creation
// ============================================================================

/// Body of `dataScans.create` for an on-demand data profile scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataScan {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub data: DataSource,
    pub execution_spec: ExecutionSpec,
    pub data_profile_spec: DataProfileSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSpec {
    pub trigger: Trigger,
}

/// Scan trigger. Only on-demand scans are created by this server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    OnDemand {},
}

impl Default for Trigger {
    fn default() -> Self {
        Self::OnDemand {}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProfileSpec {
    /// Percentage of rows to sample, in (0, 100].
    pub sampling_percent: f64,
}

// ============================================================================
// Requests
// ============================================================================

/// How much of a scan `dataScans.get` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataScanView {
    #[default]
    Basic,
    Full,
}

impl DataScanView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Full => "FULL",
        }
    }
}

/// Parameters of `dataScans.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDataScansRequest {
    /// `projects/{project}/locations/{location}`
    pub parent: String,
    pub page_size: i32,
    pub page_token: Option<String>,
    pub filter: Option<String>,
    pub order_by: Option<String>,
}

/// Parameters of `dataScans.get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataScanRequest {
    pub name: String,
    pub view: DataScanView,
}

/// Parameters of `dataScans.create`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDataScanRequest {
    pub parent: String,
    pub data_scan_id: String,
    pub data_scan: NewDataScan,
}
