//! Call timing for any [`AgentsApi`]
//!
//! `InstrumentedApi` wraps another implementation, logs the duration of every
//! call at `debug` and keeps running totals for later inspection.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;

use crate::api::{AgentsApi, ListQuery, ResourceKind};
use crate::error::FoundryResult;
use crate::models::{
    Agent, CreateAgentRequest, CreateMessageRequest, ListPage, ResourceRef, Run, Thread,
    ThreadMessage,
};

/// Totals over every call since creation or the last [`InstrumentedApi::clear`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingSummary {
    pub calls: usize,
    pub failures: usize,
    pub total_duration_ms: u64,
    pub max_duration_ms: u64,
}

impl TimingSummary {
    fn record(&mut self, duration_ms: u64, ok: bool) {
        self.calls += 1;
        if !ok {
            self.failures += 1;
        }
        self.total_duration_ms = self.total_duration_ms.saturating_add(duration_ms);
        self.max_duration_ms = self.max_duration_ms.max(duration_ms);
    }
}

pub struct InstrumentedApi<A> {
    inner: A,
    totals: Arc<RwLock<TimingSummary>>,
}

impl<A: AgentsApi> InstrumentedApi<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            totals: Arc::new(RwLock::new(TimingSummary::default())),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn summary(&self) -> TimingSummary {
        self.totals
            .read()
            .map(|t| *t)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    pub fn clear(&self) {
        match self.totals.write() {
            Ok(mut t) => *t = TimingSummary::default(),
            Err(poisoned) => *poisoned.into_inner() = TimingSummary::default(),
        }
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> FoundryResult<T>
    where
        F: Future<Output = FoundryResult<T>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let duration_ms = started.elapsed().as_millis() as u64;
        let ok = result.is_ok();

        tracing::debug!(operation, elapsed_ms = duration_ms, ok, "agents api call");
        match self.totals.write() {
            Ok(mut t) => t.record(duration_ms, ok),
            Err(poisoned) => poisoned.into_inner().record(duration_ms, ok),
        }
        result
    }
}

#[async_trait]
impl<A: AgentsApi> AgentsApi for InstrumentedApi<A> {
    async fn create_agent(&self, request: &CreateAgentRequest) -> FoundryResult<Agent> {
        self.timed("create_agent", self.inner.create_agent(request)).await
    }

    async fn delete_agent(&self, agent_id: &str) -> FoundryResult<()> {
        self.timed("delete_agent", self.inner.delete_agent(agent_id)).await
    }

    async fn create_thread(&self) -> FoundryResult<Thread> {
        self.timed("create_thread", self.inner.create_thread()).await
    }

    async fn delete_thread(&self, thread_id: &str) -> FoundryResult<()> {
        self.timed("delete_thread", self.inner.delete_thread(thread_id)).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> FoundryResult<ThreadMessage> {
        self.timed("create_message", self.inner.create_message(thread_id, request))
            .await
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> FoundryResult<Run> {
        self.timed("create_run", self.inner.create_run(thread_id, agent_id))
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> FoundryResult<Run> {
        self.timed("get_run", self.inner.get_run(thread_id, run_id)).await
    }

    async fn list_messages(&self, thread_id: &str) -> FoundryResult<ListPage<ThreadMessage>> {
        self.timed("list_messages", self.inner.list_messages(thread_id))
            .await
    }

    async fn list(
        &self,
        kind: ResourceKind,
        query: ListQuery,
    ) -> FoundryResult<ListPage<ResourceRef>> {
        self.timed("list", self.inner.list(kind, query)).await
    }
}
