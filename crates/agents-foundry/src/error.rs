//! Foundry Error Types
//!
//! Errors raised while talking to the hosted agent service and while driving
//! runs and resource cleanup.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::api::ResourceKind;
use crate::cleanup::PurgeReport;

/// Hosted agent client error
#[derive(Debug, Error)]
pub enum FoundryError {
    /// Network-level failure (connect, TLS, timeout, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bearer token could not be obtained
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Run stopped in the `incomplete` state; carries the service's details verbatim
    #[error("Run is incomplete. details: {0}")]
    RunIncomplete(Value),

    /// Run stopped in the `failed` state
    #[error("Run {run_id} failed")]
    RunFailed {
        run_id: String,
        last_error: Option<Value>,
    },

    /// Agent or thread creation failed
    #[error("Failed to acquire resources (agent: {agent}, thread: {thread})")]
    AcquisitionFailed { agent: String, thread: String },

    /// A single agent or thread could not be deleted
    #[error("Failed to delete {kind} {id}: {reason}")]
    DeletionFailed {
        kind: ResourceKind,
        id: String,
        reason: String,
    },

    /// Poll budget (deadline or attempt cap) exhausted before a terminal status
    #[error("Run {run_id} did not finish after {polls} polls ({elapsed:?})")]
    PollTimeout {
        run_id: String,
        polls: u32,
        elapsed: Duration,
    },

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Bulk purge stopped making progress; `report` holds what was done
    #[error(
        "Purge of {kind} resources stalled after {} pages ({} deleted, {} failed)",
        .report.pages,
        .report.deleted,
        .report.failed
    )]
    PurgeStalled { kind: ResourceKind, report: PurgeReport },
}

impl FoundryError {
    pub fn transport(msg: impl Into<String>) -> Self {
        FoundryError::Transport(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        FoundryError::Config(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        FoundryError::Auth(msg.into())
    }

    /// Failure of the HTTP layer rather than of the run itself
    pub fn is_transport(&self) -> bool {
        matches!(self, FoundryError::Transport(_) | FoundryError::Http { .. })
    }

    /// The run reached a terminal error status
    pub fn is_run_failure(&self) -> bool {
        matches!(
            self,
            FoundryError::RunIncomplete(_) | FoundryError::RunFailed { .. }
        )
    }
}

impl From<reqwest::Error> for FoundryError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FoundryError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => FoundryError::Transport(err.to_string()),
        }
    }
}

/// Result type alias for hosted agent operations
pub type FoundryResult<T> = Result<T, FoundryError>;
