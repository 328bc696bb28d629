//! Query clients used by the session driver.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::calculate;
use crate::models::{
    AvailableFilters, RollupResult, Scope, ScopeError, TenantId, ViewRequest,
};
use crate::storage::{FactStore, StorageError};

/// Path of the query surface, relative to the server root.
pub const LEADERBOARD_PATH: &str = "/api/leaderboard";

/// Errors surfaced to the controller for a single request.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid scope: {0}")]
    ScopeInvalid(#[from] ScopeError),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("request task ended before responding")]
    Aborted,
}

impl From<StorageError> for QueryError {
    fn from(e: StorageError) -> Self {
        QueryError::StoreUnavailable(e.to_string())
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        QueryError::Transport(e.to_string())
    }
}

/// Something that can answer the two query kinds.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn rollup(&self, scope: &Scope) -> Result<RollupResult, QueryError>;

    async fn available_filters(&self, tenant: &TenantId) -> Result<AvailableFilters, QueryError>;
}

/// Runs the engine in-process on the blocking pool.
#[derive(Clone)]
pub struct LocalClient {
    store: Arc<dyn FactStore>,
}

impl LocalClient {
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryClient for LocalClient {
    async fn rollup(&self, scope: &Scope) -> Result<RollupResult, QueryError> {
        let store = Arc::clone(&self.store);
        let scope = scope.clone();
        tokio::task::spawn_blocking(move || calculate::aggregate(store.as_ref(), &scope))
            .await
            .map_err(|_| QueryError::Aborted)?
            .map_err(QueryError::from)
    }

    async fn available_filters(&self, tenant: &TenantId) -> Result<AvailableFilters, QueryError> {
        let store = Arc::clone(&self.store);
        let tenant = tenant.clone();
        tokio::task::spawn_blocking(move || calculate::available_filters(store.as_ref(), &tenant))
            .await
            .map_err(|_| QueryError::Aborted)?
            .map_err(QueryError::from)
    }
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: ErrorBodyDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBodyDetail {
    code: String,
    message: String,
}

/// Talks to a running query surface over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClient {
    endpoint: Url,
    http: Client,
}

impl HttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QueryError> {
        let endpoint = crate::endpoint_url(base_url, LEADERBOARD_PATH)
            .map_err(|e| QueryError::InvalidUrl(e.to_string()))?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }

    /// Full URL for a request.
    pub fn url_for(&self, request: &ViewRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(Some(&request.to_query_string()));
        url
    }

    async fn get<T: DeserializeOwned>(&self, request: &ViewRequest) -> Result<T, QueryError> {
        let url = self.url_for(request);
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body).ok().map(|b| b.error);
        match detail {
            Some(d) if d.code == "STORE_UNAVAILABLE" => Err(QueryError::StoreUnavailable(d.message)),
            Some(d) => Err(QueryError::HttpStatus {
                status: status.as_u16(),
                message: d.message,
            }),
            None => Err(QueryError::HttpStatus {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

#[async_trait]
impl QueryClient for HttpClient {
    async fn rollup(&self, scope: &Scope) -> Result<RollupResult, QueryError> {
        let request = ViewRequest::Rollup(scope.clone());
        Ok(match scope {
            Scope::Companies => RollupResult::Companies(self.get(&request).await?),
            Scope::CompanyDetail { .. } => RollupResult::CompanyDetail(self.get(&request).await?),
            Scope::PlayerRankings { .. } => {
                RollupResult::PlayerRankings(self.get(&request).await?)
            }
        })
    }

    async fn available_filters(&self, tenant: &TenantId) -> Result<AvailableFilters, QueryError> {
        self.get(&ViewRequest::Filters(tenant.clone())).await
    }
}
