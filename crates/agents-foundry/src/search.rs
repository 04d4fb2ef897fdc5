//! Grounded web search
//!
//! One search is one full interaction: acquire an agent and a thread, post
//! the query, run the agent to completion and release both resources, even
//! when an earlier step failed.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::AgentsApi;
use crate::auth::TokenProvider;
use crate::config::FoundryConfig;
use crate::error::FoundryResult;
use crate::http::FoundryClient;
use crate::instrument::InstrumentedApi;
use crate::lifecycle::{ResourceLifecycle, RollbackPolicy};
use crate::models::{
    CreateAgentRequest, CreateMessageRequest, SearchConfiguration, ThreadMessage, ThreadRole,
};
use crate::poller::{cancellable, PollPolicy, RunPoller};

/// Result of one grounded search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Thread messages as returned by the service.
    pub messages: Vec<ThreadMessage>,
    /// Assistant text followed by a `Sources:` list when citations exist.
    pub answer: String,
}

impl SearchOutcome {
    pub fn from_messages(messages: Vec<ThreadMessage>) -> Self {
        let answer = compose_answer(&messages);
        Self { messages, answer }
    }
}

fn compose_answer(messages: &[ThreadMessage]) -> String {
    let assistant: Vec<&ThreadMessage> = messages
        .iter()
        .filter(|m| m.role == ThreadRole::Assistant)
        .collect();

    let mut answer = assistant
        .iter()
        .map(|m| m.text())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut seen: Vec<(String, Option<String>)> = Vec::new();
    for citation in assistant.iter().flat_map(|m| m.citations()) {
        if seen.iter().any(|(url, _)| url == &citation.url) {
            continue;
        }
        seen.push((citation.url.clone(), citation.title.clone()));
    }
    if !seen.is_empty() {
        answer.push_str("\n\nSources:");
        for (url, title) in seen {
            match title {
                Some(title) => answer.push_str(&format!("\n- {title}: {url}")),
                None => answer.push_str(&format!("\n- {url}")),
            }
        }
    }
    answer
}

pub struct GroundedSearch {
    api: Arc<dyn AgentsApi>,
    connection_id: String,
    agent_request: Option<CreateAgentRequest>,
    poll: PollPolicy,
    rollback: RollbackPolicy,
}

impl GroundedSearch {
    pub fn new(api: Arc<dyn AgentsApi>, connection_id: impl Into<String>) -> Self {
        Self {
            api,
            connection_id: connection_id.into(),
            agent_request: None,
            poll: PollPolicy::default(),
            rollback: RollbackPolicy::default(),
        }
    }

    /// HTTP-backed search with per-call timing.
    pub fn from_config(
        config: &FoundryConfig,
        tokens: Arc<dyn TokenProvider>,
    ) -> FoundryResult<Self> {
        let client = FoundryClient::from_config(config, tokens)?;
        Ok(Self::new(Arc::new(InstrumentedApi::new(client)), config.connection_id.clone())
            .with_poll_policy(config.poll.clone()))
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_rollback(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }

    /// Use a fixed agent definition instead of the default Bing-grounded one.
    pub fn with_agent_request(mut self, request: CreateAgentRequest) -> Self {
        self.agent_request = Some(request);
        self
    }

    pub fn api(&self) -> &Arc<dyn AgentsApi> {
        &self.api
    }

    /// The freshness window is relative to today, so the default
    /// definition is rebuilt for every search.
    fn agent_request(&self) -> CreateAgentRequest {
        self.agent_request.clone().unwrap_or_else(|| {
            CreateAgentRequest::bing_grounded(SearchConfiguration::new(self.connection_id.clone()))
        })
    }

    pub async fn search(&self, query: &str) -> FoundryResult<SearchOutcome> {
        self.search_with_cancel(query, &CancellationToken::new()).await
    }

    #[instrument(skip(self, cancel))]
    pub async fn search_with_cancel(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> FoundryResult<SearchOutcome> {
        let mut resources = ResourceLifecycle::new(self.api.clone(), self.agent_request())
            .with_rollback(self.rollback);

        let outcome = self.interact(&mut resources, query, cancel).await;

        let report = resources.release().await;
        for failure in &report.failures {
            warn!(error = %failure, "cleanup after search failed");
        }

        let messages = outcome?;
        info!(messages = messages.len(), "search finished");
        Ok(SearchOutcome::from_messages(messages))
    }

    async fn interact(
        &self,
        resources: &mut ResourceLifecycle,
        query: &str,
        cancel: &CancellationToken,
    ) -> FoundryResult<Vec<ThreadMessage>> {
        // Not cancellable: ids must be recorded for release.
        let acquired = resources.acquire().await?;
        cancellable(
            cancel,
            self.api
                .create_message(&acquired.thread_id, &CreateMessageRequest::user(query)),
        )
        .await?;

        RunPoller::new(self.api.clone(), self.poll.clone())
            .run_to_completion(&acquired.thread_id, &acquired.agent_id, cancel)
            .await
    }
}
