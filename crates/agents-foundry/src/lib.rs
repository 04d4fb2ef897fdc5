//! # agents-foundry
//!
//! Client for the hosted agent service of an Azure AI Foundry project, used to
//! obtain Bing-grounded answers.
//!
//! One grounded search is a short-lived interaction: create an agent and a
//! thread, post the question, start a run, poll it until it reaches a
//! terminal status, read the thread's messages, then delete the agent and the
//! thread.
//!
//! ## Features
//!
//! - **Run Poller**: fixed-interval polling with optional deadline, attempt cap and cancellation
//! - **Resource Lifecycle**: concurrent acquisition, compensating rollback and
//!   idempotent best-effort release
//! - **Bulk Cleanup**: purge every agent or thread visible to the caller
//! - **Bing Search Tool**: exposes grounded search to a function-calling model
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agents_foundry::{AzureCliTokenProvider, CachedTokenProvider, FoundryConfig, GroundedSearch};
//!
//! let config = FoundryConfig::from_env()?;
//! let tokens = Arc::new(CachedTokenProvider::new(AzureCliTokenProvider::default()));
//! let search = GroundedSearch::from_config(&config, tokens)?;
//!
//! let outcome = search.search("yesterday's Tesla news").await?;
//! println!("{}", outcome.answer);
//! ```

pub mod api;
pub mod auth;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod http;
pub mod instrument;
pub mod lifecycle;
pub mod models;
pub mod poller;
pub mod search;
pub mod tool;

#[cfg(test)]
mod testing;

// Re-exports
pub use api::{AgentsApi, ListQuery, ResourceKind};
pub use auth::{
    AccessToken, AzureCliTokenProvider, CachedTokenProvider, StaticTokenProvider, TokenProvider,
    AGENTS_SCOPE,
};
pub use cleanup::{BulkCleanup, PurgeReport};
pub use config::FoundryConfig;
pub use error::{FoundryError, FoundryResult};
pub use http::{FoundryClient, FoundryClientBuilder};
pub use instrument::{InstrumentedApi, TimingSummary};
pub use lifecycle::{Acquired, ReleaseReport, ResourceLifecycle, RollbackPolicy};
pub use models::{
    CreateAgentRequest, Run, RunStatus, SearchConfiguration, ThreadMessage, ThreadRole,
};
pub use poller::{PollPolicy, RunPoller};
pub use search::{GroundedSearch, SearchOutcome};
pub use tool::BingSearchTool;

pub use tokio_util::sync::CancellationToken;
