//! The configured Dataplex source.
//!
//! Tools never build clients themselves. They ask the source, which either
//! hands back the shared server-side client or, when client authorization
//! is enabled, a fresh client carrying the caller's own token.

use std::sync::Arc;
use tracing::debug;

use super::client::{DataScanApi, DataplexClient};
use super::error::{DataplexError, DataplexResult};
use crate::core::auth::{AccessToken, AuthError};
use crate::core::config::DataplexConfig;

/// Builds clients authenticated as a particular caller.
pub trait ClientCreator: Send + Sync {
    fn client_for_token(&self, token: &str) -> DataplexResult<Arc<dyn DataScanApi>>;
}

/// Creates reqwest clients that share one connection pool.
pub struct HttpClientCreator {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpClientCreator {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

impl ClientCreator for HttpClientCreator {
    fn client_for_token(&self, token: &str) -> DataplexResult<Arc<dyn DataScanApi>> {
        Ok(Arc::new(DataplexClient::with_http_client(
            self.http.clone(),
            self.endpoint.clone(),
            Some(token.to_string()),
        )))
    }
}

/// A Dataplex source: default project, auth mode and client factory.
pub struct DataplexSource {
    config: DataplexConfig,
    default_client: Arc<dyn DataScanApi>,
    creator: Arc<dyn ClientCreator>,
}

impl DataplexSource {
    /// Build the source and its HTTP clients from configuration.
    pub fn from_config(config: DataplexConfig) -> DataplexResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataplexError::ClientInit(e.to_string()))?;

        let default_client = DataplexClient::with_http_client(
            http.clone(),
            config.endpoint.clone(),
            config.access_token.clone(),
        );
        let creator = HttpClientCreator::new(http, config.endpoint.clone());

        Ok(Self::with_clients(
            config,
            Arc::new(default_client),
            Arc::new(creator),
        ))
    }

    /// Build a source around existing clients.
    pub fn with_clients(
        config: DataplexConfig,
        default_client: Arc<dyn DataScanApi>,
        creator: Arc<dyn ClientCreator>,
    ) -> Self {
        Self {
            config,
            default_client,
            creator,
        }
    }

    /// The project used when a call does not name one.
    pub fn project(&self) -> &str {
        &self.config.project
    }

    pub fn use_client_authorization(&self) -> bool {
        self.config.use_client_authorization
    }

    pub fn config(&self) -> &DataplexConfig {
        &self.config
    }

    /// The client to use for a call made with `access_token`.
    pub fn client(
        &self,
        access_token: Option<&AccessToken>,
    ) -> DataplexResult<Arc<dyn DataScanApi>> {
        if !self.config.use_client_authorization {
            return Ok(self.default_client.clone());
        }

        let token = access_token
            .ok_or(AuthError::Missing)
            .and_then(|t| t.parse_bearer_token())
            .map_err(|e| DataplexError::auth(format!("error parsing access token: {}", e)))?;

        debug!("Creating Dataplex client from caller access token");
        self.creator.client_for_token(token).map_err(|e| {
            DataplexError::auth(format!(
                "error creating client from OAuth access token: {}",
                e
            ))
        })
    }
}
