//! Resource lifecycle for one interaction
//!
//! Creates exactly one agent and one thread, hands their ids to the caller
//! and deletes both afterwards. Deletion is best effort: a failure on one
//! resource is reported but never prevents the attempt on the other.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::{AgentsApi, ResourceKind};
use crate::error::{FoundryError, FoundryResult};
use crate::models::CreateAgentRequest;

/// What `acquire` does with the sibling resource when only one creation succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Delete the resource that was created.
    #[default]
    Compensate,
    /// Keep it tracked; it is deleted by the next `release`.
    Leave,
}

/// Ids owned by one interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub agent_id: String,
    pub thread_id: String,
}

/// Outcome of `release`.
#[derive(Debug, Default)]
pub struct ReleaseReport {
    pub deleted: Vec<(ResourceKind, String)>,
    pub failures: Vec<FoundryError>,
}

impl ReleaseReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ResourceLifecycle {
    api: Arc<dyn AgentsApi>,
    agent_request: CreateAgentRequest,
    rollback: RollbackPolicy,
    agent_id: Option<String>,
    thread_id: Option<String>,
}

impl ResourceLifecycle {
    pub fn new(api: Arc<dyn AgentsApi>, agent_request: CreateAgentRequest) -> Self {
        Self {
            api,
            agent_request,
            rollback: RollbackPolicy::default(),
            agent_id: None,
            thread_id: None,
        }
    }

    pub fn with_rollback(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    /// Create the agent and the thread concurrently.
    #[instrument(skip(self))]
    pub async fn acquire(&mut self) -> FoundryResult<Acquired> {
        if self.agent_id.is_some() || self.thread_id.is_some() {
            return Err(FoundryError::config(
                "resources already acquired; call release() first",
            ));
        }

        let (agent, thread) = tokio::join!(
            self.api.create_agent(&self.agent_request),
            self.api.create_thread()
        );

        match (agent, thread) {
            (Ok(agent), Ok(thread)) => {
                info!(agent_id = %agent.id, thread_id = %thread.id, "resources acquired");
                self.agent_id = Some(agent.id.clone());
                self.thread_id = Some(thread.id.clone());
                Ok(Acquired {
                    agent_id: agent.id,
                    thread_id: thread.id,
                })
            }
            (agent, thread) => {
                let agent_outcome = match agent {
                    Ok(agent) => self.settle_orphan(ResourceKind::Agents, agent.id).await,
                    Err(err) => err.to_string(),
                };
                let thread_outcome = match thread {
                    Ok(thread) => self.settle_orphan(ResourceKind::Threads, thread.id).await,
                    Err(err) => err.to_string(),
                };
                Err(FoundryError::AcquisitionFailed {
                    agent: agent_outcome,
                    thread: thread_outcome,
                })
            }
        }
    }

    /// Apply the rollback policy to a resource whose sibling failed.
    async fn settle_orphan(&mut self, kind: ResourceKind, id: String) -> String {
        if self.rollback == RollbackPolicy::Compensate {
            match self.api.delete(kind, &id).await {
                Ok(()) => {
                    info!(%kind, %id, "rolled back partially acquired resource");
                    return format!("created {id} (rolled back)");
                }
                Err(err) => {
                    warn!(%kind, %id, error = %err, "rollback failed; resource stays tracked");
                }
            }
        }
        let outcome = format!("created {id}");
        match kind {
            ResourceKind::Agents => self.agent_id = Some(id),
            ResourceKind::Threads => self.thread_id = Some(id),
        }
        outcome
    }

    /// Delete the agent, then the thread. A second call is a no-op.
    #[instrument(skip(self))]
    pub async fn release(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        let owned = [
            (ResourceKind::Agents, self.agent_id.take()),
            (ResourceKind::Threads, self.thread_id.take()),
        ];

        for (kind, id) in owned {
            let Some(id) = id else { continue };
            match self.api.delete(kind, &id).await {
                Ok(()) => {
                    info!(%kind, %id, "deleted");
                    report.deleted.push((kind, id));
                }
                Err(err) => {
                    warn!(%kind, %id, error = %err, "delete failed");
                    report.failures.push(FoundryError::DeletionFailed {
                        kind,
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }
        report
    }
}
