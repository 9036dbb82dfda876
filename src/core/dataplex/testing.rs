//! In-memory `DataScanApi` used by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::client::DataScanApi;
use super::error::{DataplexError, DataplexResult};
use super::source::{ClientCreator, DataplexSource};
use super::types::{
    CreateDataScanRequest, DataScan, DataScanJob, GetDataScanRequest, ListDataScansRequest,
    ListDataScansResponse, Operation, RunDataScanResponse,
};
use crate::core::config::DataplexConfig;

#[derive(Default)]
struct State {
    pages: Vec<Vec<DataScan>>,
    list_failure: Option<(usize, DataplexError)>,
    list_requests: Vec<ListDataScansRequest>,
    stuck_page_token: Option<String>,
    scans: Vec<DataScan>,
    get_failure: Option<DataplexError>,
    get_requests: Vec<GetDataScanRequest>,
    create_response: Option<DataplexResult<Operation>>,
    create_requests: Vec<CreateDataScanRequest>,
    operation_polls: VecDeque<Operation>,
    polls: usize,
    runs: Vec<String>,
}

/// Scripted fake of the Dataplex API that records every request.
#[derive(Clone, Default)]
pub struct FakeDataScanApi {
    state: Arc<Mutex<State>>,
}

impl FakeDataScanApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these pages in order, linked by `page-N` tokens.
    pub fn with_pages(self, pages: Vec<Vec<DataScan>>) -> Self {
        self.state.lock().unwrap().pages = pages;
        self
    }

    /// Answer every list call with the same `nextPageToken`.
    pub fn with_stuck_page_token(self, token: &str) -> Self {
        self.state.lock().unwrap().stuck_page_token = Some(token.to_string());
        self
    }

    pub fn fail_list_at_page(self, page: usize, error: DataplexError) -> Self {
        self.state.lock().unwrap().list_failure = Some((page, error));
        self
    }

    pub fn with_scan(self, scan: DataScan) -> Self {
        self.state.lock().unwrap().scans.push(scan);
        self
    }

    pub fn fail_get(self, error: DataplexError) -> Self {
        self.state.lock().unwrap().get_failure = Some(error);
        self
    }

    pub fn with_create_response(self, response: DataplexResult<Operation>) -> Self {
        self.state.lock().unwrap().create_response = Some(response);
        self
    }

    /// Operations returned by successive `get_operation` calls.
    pub fn with_operation_polls(self, polls: Vec<Operation>) -> Self {
        self.state.lock().unwrap().operation_polls = polls.into();
        self
    }

    pub fn list_requests(&self) -> Vec<ListDataScansRequest> {
        self.state.lock().unwrap().list_requests.clone()
    }

    pub fn get_requests(&self) -> Vec<GetDataScanRequest> {
        self.state.lock().unwrap().get_requests.clone()
    }

    pub fn create_requests(&self) -> Vec<CreateDataScanRequest> {
        self.state.lock().unwrap().create_requests.clone()
    }

    pub fn operation_polls(&self) -> usize {
        self.state.lock().unwrap().polls
    }

    pub fn runs(&self) -> Vec<String> {
        self.state.lock().unwrap().runs.clone()
    }
}

fn page_index(token: Option<&str>) -> usize {
    token
        .and_then(|t| t.strip_prefix("page-"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[async_trait]
impl DataScanApi for FakeDataScanApi {
    async fn list_data_scans(
        &self,
        request: &ListDataScansRequest,
    ) -> DataplexResult<ListDataScansResponse> {
        let mut state = self.state.lock().unwrap();
        state.list_requests.push(request.clone());

        let index = page_index(request.page_token.as_deref());
        if state.list_failure.as_ref().map(|(page, _)| *page) == Some(index) {
            if let Some((_, error)) = state.list_failure.take() {
                return Err(error);
            }
        }

        let data_scans = state.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = match &state.stuck_page_token {
            Some(token) => Some(token.clone()),
            None => (index + 1 < state.pages.len()).then(|| format!("page-{}", index + 1)),
        };
        Ok(ListDataScansResponse {
            data_scans,
            next_page_token,
            unreachable: Vec::new(),
        })
    }

    async fn get_data_scan(&self, request: &GetDataScanRequest) -> DataplexResult<DataScan> {
        let mut state = self.state.lock().unwrap();
        state.get_requests.push(request.clone());

        if let Some(error) = state.get_failure.take() {
            return Err(error);
        }

        state
            .scans
            .iter()
            .find(|s| s.name == request.name)
            .cloned()
            .ok_or_else(|| DataplexError::api(404, format!("DataScan {} not found", request.name)))
    }

    async fn create_data_scan(
        &self,
        request: &CreateDataScanRequest,
    ) -> DataplexResult<Operation> {
        let mut state = self.state.lock().unwrap();
        state.create_requests.push(request.clone());

        match state.create_response.take() {
            Some(response) => response,
            None => Ok(Operation {
                name: format!("{}/operations/op-create", request.parent),
                done: true,
                response: Some(serde_json::json!({
                    "name": format!("{}/dataScans/{}", request.parent, request.data_scan_id),
                    "displayName": request.data_scan.display_name,
                    "state": "ACTIVE",
                    "data": request.data_scan.data,
                })),
                ..Default::default()
            }),
        }
    }

    async fn get_operation(&self, name: &str) -> DataplexResult<Operation> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        Ok(state.operation_polls.pop_front().unwrap_or_else(|| Operation {
            name: name.to_string(),
            ..Default::default()
        }))
    }

    async fn run_data_scan(&self, name: &str) -> DataplexResult<RunDataScanResponse> {
        let mut state = self.state.lock().unwrap();
        state.runs.push(name.to_string());
        Ok(RunDataScanResponse {
            job: DataScanJob {
                name: format!("{}/jobs/job-1", name),
                state: Some("PENDING".to_string()),
            },
        })
    }
}

/// Hands out the same fake for every caller token and records the tokens.
#[derive(Clone, Default)]
pub struct FakeClientCreator {
    pub api: FakeDataScanApi,
    tokens: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
}

impl FakeClientCreator {
    pub fn new(api: FakeDataScanApi) -> Self {
        Self {
            api,
            tokens: Arc::default(),
            failure: None,
        }
    }

    /// Refuse every token with a client construction error.
    pub fn failing(self, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..self
        }
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

impl ClientCreator for FakeClientCreator {
    fn client_for_token(&self, token: &str) -> DataplexResult<Arc<dyn DataScanApi>> {
        self.tokens.lock().unwrap().push(token.to_string());
        match &self.failure {
            Some(message) => Err(DataplexError::ClientInit(message.clone())),
            None => Ok(Arc::new(self.api.clone())),
        }
    }
}

/// A source for project `test-project` backed by `api`.
pub fn fake_source(api: FakeDataScanApi) -> DataplexSource {
    let config = DataplexConfig {
        project: "test-project".to_string(),
        operation_poll_interval_ms: 10,
        operation_timeout_secs: 5,
        ..Default::default()
    };
    let creator = FakeClientCreator::new(api.clone());
    DataplexSource::with_clients(config, Arc::new(api), Arc::new(creator))
}
