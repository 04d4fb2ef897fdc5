//! In-memory [`AgentsApi`] used by the unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::{AgentsApi, ListQuery, ResourceKind};
use crate::error::{FoundryError, FoundryResult};
use crate::models::{
    Agent, CreateAgentRequest, CreateMessageRequest, ListPage, ResourceRef, Run, RunStatus,
    Thread, ThreadMessage,
};

pub(crate) fn run(status: &str) -> Run {
    Run {
        id: "run_1".into(),
        thread_id: Some("thread_1".into()),
        assistant_id: Some("asst_1".into()),
        status: RunStatus::from(status),
        incomplete_details: None,
        last_error: None,
    }
}

pub(crate) fn assistant_message(id: &str, text: &str) -> ThreadMessage {
    serde_json::from_value(json!({
        "id": id,
        "role": "assistant",
        "content": [{ "type": "text", "text": { "value": text, "annotations": [] } }]
    }))
    .expect("valid message")
}

fn http_error(status: u16) -> FoundryError {
    FoundryError::Http {
        status,
        body: "scripted failure".into(),
    }
}

/// Scripted fake: run statuses are popped per `get_run`, listings are served
/// from a store that deletions shrink from the front.
pub(crate) struct ScriptedApi {
    pub submit_status: RunStatus,
    pub polls: Mutex<VecDeque<Run>>,
    pub messages: Vec<ThreadMessage>,
    pub fail_create_agent: bool,
    pub fail_create_thread: bool,
    pub fail_create_run: bool,
    pub fail_delete: HashSet<String>,
    pub agents: Mutex<Vec<String>>,
    pub threads: Mutex<Vec<String>>,
    pub page_size: usize,
    /// Listings answered with `{data: [], has_more: true}` before the store is served.
    pub lagging_pages: Mutex<usize>,
    pub calls: Mutex<Vec<String>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            submit_status: RunStatus::Queued,
            polls: Mutex::new(VecDeque::new()),
            messages: vec![assistant_message("msg_2", "grounded answer")],
            fail_create_agent: false,
            fail_create_thread: false,
            fail_create_run: false,
            fail_delete: HashSet::new(),
            agents: Mutex::new(Vec::new()),
            threads: Mutex::new(Vec::new()),
            page_size: 20,
            lagging_pages: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedApi {
    pub fn with_statuses(statuses: &[&str]) -> Self {
        Self::with_runs(statuses.iter().map(|s| run(s)).collect())
    }

    pub fn with_runs(runs: Vec<Run>) -> Self {
        Self {
            polls: Mutex::new(runs.into()),
            ..Self::default()
        }
    }

    pub fn with_store(kind: ResourceKind, ids: &[&str], page_size: usize) -> Self {
        let api = Self {
            page_size,
            ..Self::default()
        };
        *api.store(kind).lock().unwrap() = ids.iter().map(|s| s.to_string()).collect();
        api
    }

    fn store(&self, kind: ResourceKind) -> &Mutex<Vec<String>> {
        match kind {
            ResourceKind::Agents => &self.agents,
            ResourceKind::Threads => &self.threads,
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose name starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn remaining(&self, kind: ResourceKind) -> Vec<String> {
        self.store(kind).lock().unwrap().clone()
    }

    fn remove(&self, kind: ResourceKind, id: &str) -> FoundryResult<()> {
        if self.fail_delete.contains(id) {
            return Err(http_error(500));
        }
        self.store(kind).lock().unwrap().retain(|existing| existing != id);
        Ok(())
    }
}

#[async_trait]
impl AgentsApi for ScriptedApi {
    async fn create_agent(&self, _request: &CreateAgentRequest) -> FoundryResult<Agent> {
        self.record("create_agent");
        if self.fail_create_agent {
            return Err(http_error(400));
        }
        self.agents.lock().unwrap().push("asst_1".into());
        Ok(Agent {
            id: "asst_1".into(),
            name: None,
            model: None,
            instructions: None,
            created_at: None,
        })
    }

    async fn delete_agent(&self, agent_id: &str) -> FoundryResult<()> {
        self.record(format!("delete_agent:{agent_id}"));
        self.remove(ResourceKind::Agents, agent_id)
    }

    async fn create_thread(&self) -> FoundryResult<Thread> {
        self.record("create_thread");
        if self.fail_create_thread {
            return Err(http_error(503));
        }
        self.threads.lock().unwrap().push("thread_1".into());
        Ok(Thread {
            id: "thread_1".into(),
            created_at: None,
        })
    }

    async fn delete_thread(&self, thread_id: &str) -> FoundryResult<()> {
        self.record(format!("delete_thread:{thread_id}"));
        self.remove(ResourceKind::Threads, thread_id)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> FoundryResult<ThreadMessage> {
        self.record(format!("create_message:{thread_id}"));
        Ok(serde_json::from_value(json!({
            "id": "msg_1",
            "role": "user",
            "content": [{ "type": "text", "text": { "value": request.content, "annotations": [] } }]
        }))?)
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> FoundryResult<Run> {
        self.record(format!("create_run:{thread_id}:{agent_id}"));
        if self.fail_create_run {
            return Err(http_error(500));
        }
        Ok(run(self.submit_status.as_str()))
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> FoundryResult<Run> {
        self.record("get_run");
        let next = self.polls.lock().unwrap().pop_front();
        // Past the script the run stays in progress.
        Ok(next.unwrap_or_else(|| run("in_progress")))
    }

    async fn list_messages(&self, thread_id: &str) -> FoundryResult<ListPage<ThreadMessage>> {
        self.record(format!("list_messages:{thread_id}"));
        Ok(ListPage::new(self.messages.clone(), false))
    }

    async fn list(
        &self,
        kind: ResourceKind,
        query: ListQuery,
    ) -> FoundryResult<ListPage<ResourceRef>> {
        self.record(format!("list:{kind}"));
        {
            let mut lagging = self.lagging_pages.lock().unwrap();
            if *lagging > 0 {
                *lagging -= 1;
                return Ok(ListPage::new(Vec::new(), true));
            }
        }
        let store = self.store(kind).lock().unwrap();
        let size = self.page_size.min(query.limit as usize);
        let data: Vec<ResourceRef> = store
            .iter()
            .take(size)
            .map(|id| ResourceRef { id: id.clone() })
            .collect();
        Ok(ListPage::new(data, store.len() > size))
    }
}

/// `incomplete` run carrying the given details.
pub(crate) fn incomplete(details: Value) -> Run {
    Run {
        incomplete_details: Some(details),
        ..run("incomplete")
    }
}
