//! HTTP client for the hosted agent service
//!
//! Sends JSON requests to the project endpoint with the `api-version` query
//! parameter and a bearer token fetched from the configured
//! [`TokenProvider`] on every call.
//!
//! ## Example
//!
//! ```rust,ignore
//! use agents_foundry::{AzureCliTokenProvider, CachedTokenProvider, FoundryClient};
//!
//! let tokens = Arc::new(CachedTokenProvider::new(AzureCliTokenProvider::default()));
//! let client = FoundryClient::new("https://proj.services.ai.azure.com/api/projects/p1", tokens)
//!     .with_api_version("2025-05-15-preview")
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use crate::api::{AgentsApi, ListQuery, ResourceKind};
use crate::auth::TokenProvider;
use crate::config::{FoundryConfig, DEFAULT_API_VERSION, DEFAULT_TIMEOUT};
use crate::error::{FoundryError, FoundryResult};
use crate::models::{
    Agent, CreateAgentRequest, CreateMessageRequest, CreateRunRequest, ListPage, ResourceRef, Run,
    Thread, ThreadMessage,
};

/// reqwest-backed implementation of [`AgentsApi`].
pub struct FoundryClient {
    endpoint: String,
    api_version: String,
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
}

impl FoundryClient {
    /// Start building a client for the given project endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> FoundryClientBuilder {
        FoundryClientBuilder::new(endpoint, tokens)
    }

    pub fn from_config(
        config: &FoundryConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> FoundryResult<Self> {
        Self::new(config.endpoint.clone(), tokens)
            .with_api_version(config.api_version.clone())
            .with_timeout(config.timeout)
            .build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn request(&self, method: Method, path: &str) -> FoundryResult<RequestBuilder> {
        let token = self.tokens.get_token().await?;
        Ok(self
            .client
            .request(method, self.url(path))
            .query(&[("api-version", self.api_version.as_str())])
            .bearer_auth(token.token)
            .header("Content-Type", "application/json"))
    }

    async fn execute(request: RequestBuilder) -> FoundryResult<String> {
        let response = request
            .send()
            .await
            .map_err(|e| FoundryError::transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FoundryError::transport(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(FoundryError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> FoundryResult<T> {
        let body = Self::execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Builder for [`FoundryClient`]
pub struct FoundryClientBuilder {
    endpoint: String,
    api_version: String,
    timeout: Duration,
    tokens: Arc<dyn TokenProvider>,
}

impl FoundryClientBuilder {
    pub fn new(endpoint: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            tokens,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the per-request timeout (default: 60s)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> FoundryResult<FoundryClient> {
        if self.endpoint.trim().is_empty() {
            return Err(FoundryError::config("endpoint must not be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("agents-foundry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FoundryError::transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(FoundryClient {
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            api_version: self.api_version,
            client,
            tokens: self.tokens,
        })
    }
}

#[async_trait]
impl AgentsApi for FoundryClient {
    #[instrument(skip(self, request), fields(name = %request.name))]
    async fn create_agent(&self, request: &CreateAgentRequest) -> FoundryResult<Agent> {
        request.validate()?;
        let agent: Agent =
            Self::send_json(self.request(Method::POST, "assistants").await?.json(request)).await?;
        debug!(agent_id = %agent.id, "agent created");
        Ok(agent)
    }

    #[instrument(skip(self))]
    async fn delete_agent(&self, agent_id: &str) -> FoundryResult<()> {
        let path = format!("assistants/{agent_id}");
        Self::execute(self.request(Method::DELETE, &path).await?).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_thread(&self) -> FoundryResult<Thread> {
        let thread: Thread =
            Self::send_json(self.request(Method::POST, "threads").await?.json(&json!({}))).await?;
        debug!(thread_id = %thread.id, "thread created");
        Ok(thread)
    }

    #[instrument(skip(self))]
    async fn delete_thread(&self, thread_id: &str) -> FoundryResult<()> {
        let path = format!("threads/{thread_id}");
        Self::execute(self.request(Method::DELETE, &path).await?).await?;
        Ok(())
    }

    #[instrument(skip(self, request))]
    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> FoundryResult<ThreadMessage> {
        let path = format!("threads/{thread_id}/messages");
        Self::send_json(self.request(Method::POST, &path).await?.json(request)).await
    }

    #[instrument(skip(self))]
    async fn create_run(&self, thread_id: &str, agent_id: &str) -> FoundryResult<Run> {
        let path = format!("threads/{thread_id}/runs");
        let body = CreateRunRequest {
            assistant_id: agent_id.to_string(),
        };
        Self::send_json(self.request(Method::POST, &path).await?.json(&body)).await
    }

    #[instrument(skip(self))]
    async fn get_run(&self, thread_id: &str, run_id: &str) -> FoundryResult<Run> {
        let path = format!("threads/{thread_id}/runs/{run_id}");
        Self::send_json(self.request(Method::GET, &path).await?).await
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, thread_id: &str) -> FoundryResult<ListPage<ThreadMessage>> {
        let path = format!("threads/{thread_id}/messages");
        Self::send_json(self.request(Method::GET, &path).await?).await
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        kind: ResourceKind,
        query: ListQuery,
    ) -> FoundryResult<ListPage<ResourceRef>> {
        let order = if query.ascending { "asc" } else { "desc" };
        let request = self
            .request(Method::GET, kind.collection())
            .await?
            .query(&[("limit", query.limit.to_string().as_str()), ("order", order)]);
        Self::send_json(request).await
    }
}

impl std::fmt::Debug for FoundryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoundryClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .finish()
    }
}
