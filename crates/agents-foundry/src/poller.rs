//! Run poller
//!
//! Drives a single run from submission to a terminal status with fixed-delay
//! polling. Waiting is a `tokio::time::sleep`, so the task yields to the
//! scheduler between polls. An optional deadline and attempt cap bound the
//! loop, and the cancellation token is observed at every await point.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::AgentsApi;
use crate::error::{FoundryError, FoundryResult};
use crate::models::{Run, RunStatus, ThreadMessage};

/// Polling budget for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay between polls (no backoff).
    pub interval: Duration,
    /// Give up once this much time has passed since the first status poll.
    pub deadline: Option<Duration>,
    /// Give up after this many status polls.
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: None,
            max_polls: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }
}

/// Await `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> FoundryResult<T>
where
    F: Future<Output = FoundryResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FoundryError::Cancelled),
        result = fut => result,
    }
}

pub struct RunPoller {
    api: Arc<dyn AgentsApi>,
    policy: PollPolicy,
}

impl RunPoller {
    pub fn new(api: Arc<dyn AgentsApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Start a run of `agent_id` on `thread_id`, wait for it, and return the
    /// thread's messages when it completes.
    #[instrument(skip(self, cancel))]
    pub async fn run_to_completion(
        &self,
        thread_id: &str,
        agent_id: &str,
        cancel: &CancellationToken,
    ) -> FoundryResult<Vec<ThreadMessage>> {
        let run = cancellable(cancel, self.api.create_run(thread_id, agent_id)).await?;
        info!(run_id = %run.id, status = %run.status, "run submitted");

        let finished = match run.status {
            RunStatus::Completed | RunStatus::Failed => run,
            _ => self.wait_for_terminal(thread_id, &run.id, cancel).await?,
        };

        match finished.status {
            RunStatus::Completed => {
                let page = cancellable(cancel, self.api.list_messages(thread_id)).await?;
                debug!(run_id = %finished.id, messages = page.data.len(), "run completed");
                Ok(page.data)
            }
            RunStatus::Incomplete => {
                let details = finished.incomplete_details.unwrap_or_default();
                warn!(run_id = %finished.id, %details, "run incomplete");
                Err(FoundryError::RunIncomplete(details))
            }
            _ => {
                warn!(run_id = %finished.id, last_error = ?finished.last_error, "run failed");
                Err(FoundryError::RunFailed {
                    run_id: finished.id,
                    last_error: finished.last_error,
                })
            }
        }
    }

    /// Poll until the run reports `completed`, `failed` or `incomplete`.
    async fn wait_for_terminal(
        &self,
        thread_id: &str,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> FoundryResult<Run> {
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            if self.policy.max_polls.is_some_and(|max| polls >= max)
                || self.policy.deadline.is_some_and(|d| started.elapsed() >= d)
            {
                return Err(FoundryError::PollTimeout {
                    run_id: run_id.to_string(),
                    polls,
                    elapsed: started.elapsed(),
                });
            }

            let run = cancellable(cancel, self.api.get_run(thread_id, run_id)).await?;
            polls += 1;
            if run.status.is_terminal() {
                debug!(run_id, polls, status = %run.status, "run reached terminal status");
                return Ok(run);
            }
            debug!(run_id, polls, status = %run.status, "Run status");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FoundryError::Cancelled),
                _ = tokio::time::sleep(self.policy.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{incomplete, run, ScriptedApi};
    use serde_json::json;

    fn poller(api: &Arc<ScriptedApi>, policy: PollPolicy) -> RunPoller {
        RunPoller::new(api.clone(), policy)
    }

    #[tokio::test(start_paused = true)]
    async fn completed_sequence_fetches_messages_once_after_last_poll() {
        let api = Arc::new(ScriptedApi::with_statuses(&[
            "queued",
            "in_progress",
            "completed",
        ]));
        let messages = poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text(), "grounded answer");
        assert_eq!(api.count("get_run"), 3);
        assert_eq!(api.count("list_messages"), 1);
        assert_eq!(
            api.calls().last().map(String::as_str),
            Some("list_messages:thread_1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn polls_are_spaced_by_the_interval() {
        let api = Arc::new(ScriptedApi::with_statuses(&[
            "queued",
            "in_progress",
            "completed",
        ]));
        let started = Instant::now();
        poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap();

        // Two sleeps between three polls, no backoff.
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_carries_details_and_skips_fetch() {
        let api = Arc::new(ScriptedApi::with_runs(vec![
            run("queued"),
            incomplete(json!({ "reason": "X" })),
        ]));
        let err = poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            FoundryError::RunIncomplete(details) => assert_eq!(details, json!({ "reason": "X" })),
            other => panic!("expected RunIncomplete, got {other:?}"),
        }
        assert_eq!(api.count("list_messages"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_is_reported_without_fetch() {
        let api = Arc::new(ScriptedApi::with_statuses(&["in_progress", "failed"]));
        let err = poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FoundryError::RunFailed { ref run_id, .. } if run_id == "run_1"));
        assert_eq!(api.count("get_run"), 2);
        assert_eq!(api.count("list_messages"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_statuses_keep_polling() {
        let api = Arc::new(ScriptedApi::with_statuses(&[
            "requires_action",
            "cancelling",
            "something_new",
            "completed",
        ]));
        poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(api.count("get_run"), 4);
    }

    #[tokio::test]
    async fn completed_submission_skips_polling() {
        let api = Arc::new(ScriptedApi {
            submit_status: RunStatus::Completed,
            ..ScriptedApi::default()
        });
        poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(api.count("get_run"), 0);
        assert_eq!(api.count("list_messages"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn max_polls_bounds_the_loop() {
        // Script is empty, so the fake reports in_progress forever.
        let api = Arc::new(ScriptedApi::default());
        let err = poller(&api, PollPolicy::default().with_max_polls(5))
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, FoundryError::PollTimeout { polls: 5, .. }));
        assert_eq!(api.count("get_run"), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_loop() {
        let api = Arc::new(ScriptedApi::default());
        let err = poller(
            &api,
            PollPolicy::default().with_deadline(Duration::from_millis(3500)),
        )
        .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
        .await
        .unwrap_err();

        // Polls at t=0,1,2,3; the check at t=4 exceeds the deadline.
        assert!(matches!(err, FoundryError::PollTimeout { polls: 4, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_sleep() {
        let api = Arc::new(ScriptedApi::default());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        });

        let err = poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FoundryError::Cancelled));
        assert_eq!(api.count("get_run"), 2);
    }

    #[tokio::test]
    async fn submission_failure_propagates() {
        let api = Arc::new(ScriptedApi {
            fail_create_run: true,
            ..ScriptedApi::default()
        });
        let err = poller(&api, PollPolicy::default())
            .run_to_completion("thread_1", "asst_1", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(api.count("get_run"), 0);
    }
}
