//! Common utilities shared across the data scan tools.
//!
//! Resource-name parsing, request-field helpers, and result formatting.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

use crate::core::DataplexError;
use crate::core::dataplex::DataplexSource;
use crate::domains::tools::ToolError;

/// Resource prefix of BigQuery tables as Dataplex expects them.
pub const BIGQUERY_RESOURCE_PREFIX: &str = "//bigquery.googleapis.com/";

/// Upper bound Dataplex accepts for `pageSize`.
const MAX_PAGE_SIZE: i32 = 1000;

/// Maximum length of a data scan id.
const MAX_DATA_SCAN_ID_LENGTH: usize = 63;

// ============================================================================
// Resource names
// ============================================================================

/// A BigQuery table, as `project.dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigQueryTableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl BigQueryTableRef {
    /// Parse a table reference.
    ///
    /// Accepts `project.dataset.table`, `dataset.table` (in
    /// `default_project`), or the full
    /// `//bigquery.googleapis.com/projects/P/datasets/D/tables/T` form.
    pub fn parse(input: &str, default_project: &str) -> Result<Self, ToolError> {
        let input = input.trim();
        let invalid = || {
            ToolError::invalid_arguments(format!(
                "invalid table reference '{}': expected project.dataset.table, \
                 dataset.table or {}projects/P/datasets/D/tables/T",
                input, BIGQUERY_RESOURCE_PREFIX
            ))
        };

        if let Some(path) = input.strip_prefix(BIGQUERY_RESOURCE_PREFIX) {
            let segments: Vec<&str> = path.split('/').collect();
            return match segments.as_slice() {
                ["projects", project, "datasets", dataset, "tables", table]
                    if [project, dataset, table].iter().all(|s| !s.is_empty()) =>
                {
                    Ok(Self::new(*project, *dataset, *table))
                }
                _ => Err(invalid()),
            };
        }

        let parts: Vec<&str> = input.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }
        match parts.as_slice() {
            [project, dataset, table] => Ok(Self::new(*project, *dataset, *table)),
            [dataset, table] if !default_project.is_empty() => {
                Ok(Self::new(default_project, *dataset, *table))
            }
            [_, _] => Err(ToolError::invalid_arguments(format!(
                "table '{}' has no project and no default project is configured",
                input
            ))),
            _ => Err(invalid()),
        }
    }

    fn new(project: &str, dataset: &str, table: &str) -> Self {
        Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
        }
    }

    /// The table as a Dataplex data source resource.
    pub fn resource_name(&self) -> String {
        format!(
            "{}projects/{}/datasets/{}/tables/{}",
            BIGQUERY_RESOURCE_PREFIX, self.project, self.dataset, self.table
        )
    }
}

impl fmt::Display for BigQueryTableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// A data scan resource name: `projects/P/locations/L/dataScans/ID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataScanName {
    pub project: String,
    pub location: String,
    pub data_scan_id: String,
}

impl DataScanName {
    pub fn parse(name: &str) -> Option<Self> {
        let segments: Vec<&str> = name.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["projects", project, "locations", location, "dataScans", id]
                if [project, location, id].iter().all(|s| !s.is_empty()) =>
            {
                Some(Self {
                    project: project.to_string(),
                    location: location.to_string(),
                    data_scan_id: id.to_string(),
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for DataScanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/dataScans/{}",
            self.project, self.location, self.data_scan_id
        )
    }
}

/// `projects/{project}/locations/{location}`
pub fn location_parent(project: &str, location: &str) -> String {
    format!("projects/{}/locations/{}", project, location)
}

/// List filter restricting results to `state`, if one was given.
pub fn state_filter(state: &str) -> Option<String> {
    let state = state.trim();
    (!state.is_empty()).then(|| format!("state=\"{}\"", state))
}

/// The project a call targets: the explicit one, else the source default.
pub fn resolve_project(requested: &str, source: &DataplexSource) -> Result<String, ToolError> {
    let requested = requested.trim();
    if !requested.is_empty() {
        return Ok(requested.to_string());
    }
    if source.project().is_empty() {
        return Err(ToolError::invalid_arguments(
            "project parameter is required when the source has no default project",
        ));
    }
    Ok(source.project().to_string())
}

/// Require a non-empty `location`.
pub fn require_location(location: &str) -> Result<&str, ToolError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(ToolError::invalid_arguments(
            "location parameter is required",
        ));
    }
    Ok(location)
}

/// Default page size for list calls.
pub fn default_page_size() -> i32 {
    5
}

/// Clamp a page size to the range the API accepts (1-1000).
pub fn validate_page_size(page_size: i32) -> i32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Whether `id` is a valid data scan id: lowercase letters, digits and
/// hyphens, starting with a letter, ending with a letter or digit.
pub fn is_valid_data_scan_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_DATA_SCAN_ID_LENGTH
        && id.starts_with(|c: char| c.is_ascii_lowercase())
        && !id.ends_with('-')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Derive a data scan id for profiling `table`.
pub fn derive_data_scan_id(table: &BigQueryTableRef) -> String {
    let mut base = String::with_capacity(table.table.len());
    for c in table.table.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            base.push(c);
        } else if !base.ends_with('-') {
            base.push('-');
        }
    }
    let mut base = base.trim_matches('-').to_string();
    if base.is_empty() {
        base = "table".to_string();
    }
    if !base.starts_with(|c: char| c.is_ascii_lowercase()) {
        base.insert_str(0, "t-");
    }

    const SUFFIX: &str = "-profile";
    base.truncate(MAX_DATA_SCAN_ID_LENGTH - SUFFIX.len());
    let base = base.trim_end_matches('-');
    format!("{}{}", base, SUFFIX)
}

// ============================================================================
// Results
// ============================================================================

/// Message for a failed remote call, naming the project it targeted.
pub fn api_failure_message(action: &str, project: &str, err: &DataplexError) -> String {
    error!("Failed to {} for project {}: {}", action, project, err);
    match err.api_message() {
        Some(message) => format!(
            "failed to {} for project \"{}\" with error: {}",
            action, project, message
        ),
        None => format!("failed to {} for project \"{}\"", action, project),
    }
}

/// Create an error result with a formatted message.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(message.to_string())])
}

/// Create a success result carrying both a summary and structured data.
pub fn structured_result<T: Serialize>(summary: String, data: T) -> CallToolResult {
    match serde_json::to_value(&data) {
        Ok(value) => {
            let mut result = CallToolResult::success(vec![Content::text(summary)]);
            result.structured_content = Some(value);
            result
        }
        Err(e) => error_result(&ToolError::internal(format!("failed to encode result: {}", e)).to_string()),
    }
}

/// Convert a tool result into the JSON body returned over HTTP.
#[cfg(feature = "http")]
pub fn http_response(result: CallToolResult) -> serde_json::Value {
    let mut response = serde_json::json!({
        "content": result.content,
        "isError": result.is_error.unwrap_or(false)
    });

    if let (Some(structured), Some(body)) = (result.structured_content, response.as_object_mut()) {
        body.insert("structuredContent".to_string(), structured);
    }

    response
}
