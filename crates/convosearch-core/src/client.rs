use std::time::Duration;

use anyhow::Context;
use convosearch_shared::dispatch::{
    CATEGORIES_FAILED, HEALTH_FAILED, QUESTION_FAILED, SEARCH_FAILED, TICKET_FAILED,
    TICKETS_FAILED, TRIAGE_FAILED, decode_body, status_failure,
};
use convosearch_shared::{
    CATEGORIES_PATH, CategoriesResponse, DispatchError, HEALTH_PATH, HealthResponse, QUERY_PATH,
    QueryRequest, QueryResponse, SEARCH_PATH, SearchRequest, SearchResponse, SearchResults,
    TICKETS_PATH, TRIAGE_PATH, TicketCreateRequest, TicketCreateResponse, TicketList,
    TriageRequest, TriageResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::Config;

/// The search/QA service as seen by a session.
#[allow(async_fn_in_trait)]
pub trait SearchBackend {
    async fn categories(&self) -> Result<Vec<String>, DispatchError>;
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, DispatchError>;
    async fn ask(&self, request: &QueryRequest) -> Result<QueryResponse, DispatchError>;
    async fn triage(&self, request: &TriageRequest) -> Result<TriageResponse, DispatchError>;
    async fn create_ticket(
        &self,
        request: &TicketCreateRequest,
    ) -> Result<TicketCreateResponse, DispatchError>;
    async fn list_tickets(&self) -> Result<TicketList, DispatchError>;
    async fn health(&self) -> Result<HealthResponse, DispatchError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: Config,
}

impl HttpBackend {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("convosearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed building HTTP client")?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        fallback: &str,
    ) -> Result<T, DispatchError> {
        let url = self.config.endpoint(path);
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        self.execute(request, &url, fallback).await
    }

    #[tracing::instrument(skip(self, body))]
    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, DispatchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        let payload = serde_json::to_vec(body)
            .map_err(|e| DispatchError::Transport(format!("failed to encode body: {e}")))?;
        let request = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        self.execute(request, &url, fallback).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        fallback: &str,
    ) -> Result<T, DispatchError> {
        let response = request.send().await.map_err(|error| {
            warn!(url = %url, error = %error, "request failed");
            DispatchError::Transport(error.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            warn!(url = %url, error = %error, "failed reading response body");
            DispatchError::Transport(error.to_string())
        })?;
        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(status_failure(status.as_u16(), &body, fallback));
        }
        decode_body(&body, fallback)
    }
}

impl SearchBackend for HttpBackend {
    async fn categories(&self) -> Result<Vec<String>, DispatchError> {
        self.get_json::<CategoriesResponse>(CATEGORIES_PATH, CATEGORIES_FAILED)
            .await?
            .into_result()
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, DispatchError> {
        self.post_json::<_, SearchResponse>(SEARCH_PATH, request, SEARCH_FAILED)
            .await?
            .into_result()
    }

    async fn ask(&self, request: &QueryRequest) -> Result<QueryResponse, DispatchError> {
        self.post_json(QUERY_PATH, request, QUESTION_FAILED).await
    }

    async fn triage(&self, request: &TriageRequest) -> Result<TriageResponse, DispatchError> {
        self.post_json(TRIAGE_PATH, request, TRIAGE_FAILED).await
    }

    async fn create_ticket(
        &self,
        request: &TicketCreateRequest,
    ) -> Result<TicketCreateResponse, DispatchError> {
        self.post_json(TICKETS_PATH, request, TICKET_FAILED).await
    }

    async fn list_tickets(&self) -> Result<TicketList, DispatchError> {
        self.get_json(TICKETS_PATH, TICKETS_FAILED).await
    }

    async fn health(&self) -> Result<HealthResponse, DispatchError> {
        self.get_json(HEALTH_PATH, HEALTH_FAILED).await
    }
}
