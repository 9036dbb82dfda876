//! Dataplex `dataScans` client.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::error::{DataplexError, DataplexResult};
use super::types::{
    CreateDataScanRequest, DataScan, ErrorEnvelope, GetDataScanRequest, ListDataScansRequest,
    ListDataScansResponse, Operation, RunDataScanResponse,
};

/// Operations the tools need from the data scan service.
#[async_trait]
pub trait DataScanApi: Send + Sync {
    /// Fetch a single page of data scans.
    async fn list_data_scans(
        &self,
        request: &ListDataScansRequest,
    ) -> DataplexResult<ListDataScansResponse>;

    async fn get_data_scan(&self, request: &GetDataScanRequest) -> DataplexResult<DataScan>;

    /// Start creating a data scan; returns the long-running operation.
    async fn create_data_scan(&self, request: &CreateDataScanRequest)
    -> DataplexResult<Operation>;

    async fn get_operation(&self, name: &str) -> DataplexResult<Operation>;

    /// Trigger an on-demand run of an existing scan.
    async fn run_data_scan(&self, name: &str) -> DataplexResult<RunDataScanResponse>;
}

/// Drain every page of a list call, keeping the server's ordering.
pub async fn list_all_data_scans(
    api: &dyn DataScanApi,
    request: &ListDataScansRequest,
) -> DataplexResult<Vec<DataScan>> {
    let mut page_request = request.clone();
    let mut scans = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = api.list_data_scans(&page_request).await?;
        pages += 1;
        if !page.unreachable.is_empty() {
            warn!("Locations unreachable while listing: {:?}", page.unreachable);
        }
        scans.extend(page.data_scans);

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(token) if page_request.page_token.as_deref() == Some(token.as_str()) => {
                return Err(DataplexError::decode(format!(
                    "list returned the same page token twice: {}",
                    token
                )));
            }
            Some(token) => page_request.page_token = Some(token),
            None => break,
        }
    }

    debug!("Listed {} data scan(s) over {} page(s)", scans.len(), pages);
    Ok(scans)
}

/// Poll a long-running operation until it is done.
pub async fn wait_for_operation(
    api: &dyn DataScanApi,
    operation: Operation,
    poll_interval: Duration,
    timeout: Duration,
) -> DataplexResult<Operation> {
    let deadline = Instant::now() + timeout;
    let mut current = operation;

    while !current.done {
        if Instant::now() >= deadline {
            return Err(DataplexError::OperationTimeout {
                name: current.name,
                waited_secs: timeout.as_secs(),
            });
        }
        tokio::time::sleep(poll_interval).await;
        debug!("Polling operation {}", current.name);
        current = api.get_operation(&current.name).await?;
    }

    if let Some(status) = current.error {
        return Err(DataplexError::OperationFailed {
            name: current.name,
            message: status.message,
        });
    }

    Ok(current)
}

// ============================================================================
// REST implementation
// ============================================================================

/// Dataplex REST client backed by reqwest.
#[derive(Clone)]
pub struct DataplexClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery<'a> {
    page_size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<&'a str>,
}

impl DataplexClient {
    /// Create a client for `endpoint` on a shared connection pool,
    /// authenticating with `token` when given.
    pub fn with_http_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Absolute URL of a `v1` resource path.
    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> DataplexResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| DataplexError::decode(e.to_string()))
    }

    async fn error_from_response(response: Response) -> DataplexError {
        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => parse_error_body(status, &body),
            Err(e) => DataplexError::Http(e),
        }
    }
}

/// Turn a failed response body into an API error.
fn parse_error_body(status: u16, body: &str) -> DataplexError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => DataplexError::api(status, envelope.error.message),
        Err(_) => DataplexError::api(status, ""),
    }
}

fn list_query_string(request: &ListDataScansRequest) -> DataplexResult<String> {
    let query = ListQuery {
        page_size: request.page_size,
        page_token: request.page_token.as_deref(),
        filter: request.filter.as_deref(),
        order_by: request.order_by.as_deref(),
    };
    serde_urlencoded::to_string(&query).map_err(|e| DataplexError::decode(e.to_string()))
}

#[async_trait]
impl DataScanApi for DataplexClient {
    #[instrument(skip_all, fields(parent = %request.parent))]
    async fn list_data_scans(
        &self,
        request: &ListDataScansRequest,
    ) -> DataplexResult<ListDataScansResponse> {
        let url = format!(
            "{}?{}",
            self.url(&format!("{}/dataScans", request.parent)),
            list_query_string(request)?
        );
        debug!("GET {}", url);
        self.send(self.request(Method::GET, url)).await
    }

    #[instrument(skip_all, fields(name = %request.name))]
    async fn get_data_scan(&self, request: &GetDataScanRequest) -> DataplexResult<DataScan> {
        let url = format!("{}?view={}", self.url(&request.name), request.view.as_str());
        debug!("GET {}", url);
        self.send(self.request(Method::GET, url)).await
    }

    #[instrument(skip_all, fields(parent = %request.parent, id = %request.data_scan_id))]
    async fn create_data_scan(
        &self,
        request: &CreateDataScanRequest,
    ) -> DataplexResult<Operation> {
        let query = serde_urlencoded::to_string(&[("dataScanId", request.data_scan_id.as_str())])
            .map_err(|e| DataplexError::decode(e.to_string()))?;
        let url = format!(
            "{}?{}",
            self.url(&format!("{}/dataScans", request.parent)),
            query
        );
        debug!("POST {} body={:?}", url, request.data_scan);
        self.send(self.request(Method::POST, url).json(&request.data_scan))
            .await
    }

    async fn get_operation(&self, name: &str) -> DataplexResult<Operation> {
        self.send(self.request(Method::GET, self.url(name))).await
    }

    #[instrument(skip(self))]
    async fn run_data_scan(&self, name: &str) -> DataplexResult<RunDataScanResponse> {
        let url = format!("{}:run", self.url(name));
        debug!("POST {}", url);
        self.send(
            self.request(Method::POST, url)
                .json(&serde_json::json!({})),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataplex::testing::FakeDataScanApi;
    use crate::core::dataplex::types::Status;

    fn scan(name: &str) -> DataScan {
        DataScan {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_joins_endpoint_and_path() {
        let client = DataplexClient::with_http_client(
            reqwest::Client::new(),
            "https://dataplex.googleapis.com/",
            None,
        );
        assert_eq!(
            client.url("projects/p/locations/l/dataScans/s"),
            "https://dataplex.googleapis.com/v1/projects/p/locations/l/dataScans/s"
        );
    }

    #[test]
    fn test_list_query_string_encodes_filter_and_order() {
        let request = ListDataScansRequest {
            parent: "projects/p/locations/l".to_string(),
            page_size: 5,
            page_token: None,
            filter: Some("state=\"ACTIVE\"".to_string()),
            order_by: Some("create_time desc".to_string()),
        };
        assert_eq!(
            list_query_string(&request).unwrap(),
            "pageSize=5&filter=state%3D%22ACTIVE%22&orderBy=create_time+desc"
        );
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"error":{"code":404,"message":"DataScan not found","status":"NOT_FOUND"}}"#;
        let err = parse_error_body(404, body);
        assert_eq!(err.api_message(), Some("DataScan not found"));

        let err = parse_error_body(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, DataplexError::Api { status: 502, .. }));
        assert_eq!(err.api_message(), None);
    }

    #[tokio::test]
    async fn test_list_all_follows_page_tokens() {
        let fake = FakeDataScanApi::new().with_pages(vec![
            vec![scan("a"), scan("b")],
            vec![scan("c")],
            vec![scan("d")],
        ]);
        let request = ListDataScansRequest {
            parent: "projects/p/locations/l".to_string(),
            page_size: 2,
            ..Default::default()
        };

        let scans = list_all_data_scans(&fake, &request).await.unwrap();
        let names: Vec<_> = scans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        let seen = fake.list_requests();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].page_token, None);
        assert_eq!(seen[1].page_token.as_deref(), Some("page-1"));
        assert_eq!(seen[2].page_token.as_deref(), Some("page-2"));
    }

    #[tokio::test]
    async fn test_list_all_stops_on_repeated_page_token() {
        let fake = FakeDataScanApi::new()
            .with_pages(vec![vec![scan("a")], vec![scan("b")]])
            .with_stuck_page_token("page-1");
        let request = ListDataScansRequest {
            parent: "projects/p/locations/l".to_string(),
            ..Default::default()
        };

        let err = list_all_data_scans(&fake, &request).await.unwrap_err();

        assert!(matches!(err, DataplexError::Decode(_)));
        assert!(err.to_string().contains("same page token twice: page-1"));
        assert_eq!(fake.list_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_list_all_propagates_page_error() {
        let fake = FakeDataScanApi::new()
            .with_pages(vec![vec![scan("a")], vec![scan("b")]])
            .fail_list_at_page(1, DataplexError::api(503, "backend unavailable"));
        let request = ListDataScansRequest::default();

        let err = list_all_data_scans(&fake, &request).await.unwrap_err();
        assert_eq!(err.api_message(), Some("backend unavailable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_operation_polls_until_done() {
        let fake = FakeDataScanApi::new().with_operation_polls(vec![
            Operation {
                name: "op-1".to_string(),
                done: false,
                ..Default::default()
            },
            Operation {
                name: "op-1".to_string(),
                done: true,
                response: Some(serde_json::json!({ "name": "scan" })),
                ..Default::default()
            },
        ]);
        let start = Operation {
            name: "op-1".to_string(),
            ..Default::default()
        };

        let done = wait_for_operation(
            &fake,
            start,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .await
        .unwrap();
        assert!(done.done);
        assert_eq!(fake.operation_polls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_operation_reports_failure() {
        let fake = FakeDataScanApi::new().with_operation_polls(vec![Operation {
            name: "op-2".to_string(),
            done: true,
            error: Some(Status {
                code: 6,
                message: "already exists".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }]);
        let start = Operation {
            name: "op-2".to_string(),
            ..Default::default()
        };

        let err = wait_for_operation(&fake, start, Duration::from_millis(10), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DataplexError::OperationFailed { .. }));
        assert_eq!(err.api_message(), Some("already exists"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_operation_times_out() {
        let fake = FakeDataScanApi::new();
        let start = Operation {
            name: "op-3".to_string(),
            ..Default::default()
        };

        let err = wait_for_operation(&fake, start, Duration::from_secs(1), Duration::from_secs(3))
            .await
            .unwrap_err();
        assert!(matches!(err, DataplexError::OperationTimeout { waited_secs: 3, .. }));
    }
}
