//! Hosted agent API abstraction
//!
//! The poller, the lifecycle manager and the cleanup utility only talk to the
//! service through [`AgentsApi`], so they can be driven by the HTTP client or
//! by an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FoundryResult;
use crate::models::{
    Agent, CreateAgentRequest, CreateMessageRequest, ListPage, ResourceRef, Run, Thread,
    ThreadMessage,
};

/// Kind of deletable resource owned by an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Agents,
    Threads,
}

impl ResourceKind {
    /// Collection segment in the service URL.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Agents => "assistants",
            ResourceKind::Threads => "threads",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Agents => f.write_str("agent"),
            ResourceKind::Threads => f.write_str("thread"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" | "agents" | "assistant" | "assistants" => Ok(ResourceKind::Agents),
            "thread" | "threads" => Ok(ResourceKind::Threads),
            other => Err(format!("unknown resource kind: {other}")),
        }
    }
}

/// Query for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: u32,
    pub ascending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 20,
            ascending: true,
        }
    }
}

/// Logical operations of the hosted agent service.
#[async_trait]
pub trait AgentsApi: Send + Sync {
    async fn create_agent(&self, request: &CreateAgentRequest) -> FoundryResult<Agent>;

    async fn delete_agent(&self, agent_id: &str) -> FoundryResult<()>;

    async fn create_thread(&self) -> FoundryResult<Thread>;

    async fn delete_thread(&self, thread_id: &str) -> FoundryResult<()>;

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> FoundryResult<ThreadMessage>;

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> FoundryResult<Run>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> FoundryResult<Run>;

    async fn list_messages(&self, thread_id: &str) -> FoundryResult<ListPage<ThreadMessage>>;

    async fn list(&self, kind: ResourceKind, query: ListQuery)
        -> FoundryResult<ListPage<ResourceRef>>;

    /// Delete one resource of the given kind.
    async fn delete(&self, kind: ResourceKind, id: &str) -> FoundryResult<()> {
        match kind {
            ResourceKind::Agents => self.delete_agent(id).await,
            ResourceKind::Threads => self.delete_thread(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_kind_parses_aliases() {
        assert_eq!("assistants".parse::<ResourceKind>(), Ok(ResourceKind::Agents));
        assert_eq!("thread".parse::<ResourceKind>(), Ok(ResourceKind::Threads));
        assert!("runs".parse::<ResourceKind>().is_err());
        assert_eq!(ResourceKind::Agents.collection(), "assistants");
        assert_eq!(ResourceKind::Threads.to_string(), "thread");
    }
}
